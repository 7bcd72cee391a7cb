use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::error::{SifenError, ValidationError};
use super::numbering::DocumentNumber;
use super::types::*;
use super::validation;

/// Builder for constructing valid invoices.
///
/// ```
/// use sifen::core::*;
/// use rust_decimal_macros::dec;
/// use chrono::NaiveDate;
///
/// let issued_at = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap().and_hms_opt(9, 30, 0).unwrap();
/// let address = AddressBuilder::new("Av. Mcal. López", "1234", "1", "1").build();
/// let invoice = InvoiceBuilder::new("001-001-0000001", issued_at)
///     .security_code("123456789")
///     .stamp("12345678", NaiveDate::from_ymd_opt(2025, 1, 1).unwrap())
///     .issuer(IssuerBuilder::new("80012345", "7", "Tecnología S.A.", address)
///         .phone("021 555 000")
///         .email("ventas@tecnologia.com.py")
///         .activity("62010")
///         .build())
///     .recipient(RecipientBuilder::taxpayer("80054321", "3", "Cliente S.R.L.").build())
///     .add_line(LineItemBuilder::new("SRV-01", "Consultoría", dec!(1), dec!(1500000)).build())
///     .build()
///     .unwrap();
/// assert_eq!(invoice.totals().tax_total, dec!(150000.00));
/// ```
pub struct InvoiceBuilder {
    number: String,
    issued_at: NaiveDateTime,
    emission_type: u8,
    security_code: Option<String>,
    issuer_info: Option<String>,
    fiscal_info: Option<String>,
    stamp: Option<Stamp>,
    transaction_type: u8,
    tax_affected: u8,
    currency: String,
    exchange_rate: Option<ExchangeRate>,
    advance_condition: Option<u8>,
    issuer: Option<Issuer>,
    recipient: Option<Recipient>,
    presence: u8,
    payment: PaymentCondition,
    lines: Vec<LineItem>,
    sector: Option<SectorExtension>,
    transport: Option<Transport>,
    cargo: Option<GeneralCargo>,
}

impl InvoiceBuilder {
    pub fn new(number: impl Into<String>, issued_at: NaiveDateTime) -> Self {
        Self {
            number: number.into(),
            issued_at,
            emission_type: 1,
            security_code: None,
            issuer_info: None,
            fiscal_info: None,
            stamp: None,
            transaction_type: 1,
            tax_affected: 1,
            currency: "PYG".to_string(),
            exchange_rate: None,
            advance_condition: None,
            issuer: None,
            recipient: None,
            presence: 1,
            payment: PaymentCondition::Cash,
            lines: Vec::new(),
            sector: None,
            transport: None,
            cargo: None,
        }
    }

    pub fn emission_type(mut self, code: u8) -> Self {
        self.emission_type = code;
        self
    }

    pub fn security_code(mut self, code: impl Into<String>) -> Self {
        self.security_code = Some(code.into());
        self
    }

    pub fn issuer_info(mut self, info: impl Into<String>) -> Self {
        self.issuer_info = Some(info.into());
        self
    }

    pub fn fiscal_info(mut self, info: impl Into<String>) -> Self {
        self.fiscal_info = Some(info.into());
        self
    }

    pub fn stamp(mut self, number: impl Into<String>, valid_from: impl Into<DateInput>) -> Self {
        self.stamp = Some(Stamp {
            number: number.into(),
            series: None,
            valid_from: valid_from.into(),
        });
        self
    }

    /// Two-letter series of the stamp. Has no effect before [`Self::stamp`].
    pub fn stamp_series(mut self, series: impl Into<String>) -> Self {
        if let Some(stamp) = self.stamp.as_mut() {
            stamp.series = Some(series.into());
        }
        self
    }

    pub fn transaction_type(mut self, code: u8) -> Self {
        self.transaction_type = code;
        self
    }

    pub fn tax_affected(mut self, code: u8) -> Self {
        self.tax_affected = code;
        self
    }

    pub fn currency(mut self, code: impl Into<String>) -> Self {
        self.currency = code.into();
        self
    }

    pub fn exchange_rate(mut self, condition: u8, rate: Decimal) -> Self {
        self.exchange_rate = Some(ExchangeRate { condition, rate });
        self
    }

    pub fn advance_condition(mut self, code: u8) -> Self {
        self.advance_condition = Some(code);
        self
    }

    pub fn issuer(mut self, issuer: Issuer) -> Self {
        self.issuer = Some(issuer);
        self
    }

    pub fn recipient(mut self, recipient: Recipient) -> Self {
        self.recipient = Some(recipient);
        self
    }

    pub fn presence(mut self, code: u8) -> Self {
        self.presence = code;
        self
    }

    pub fn payment(mut self, payment: PaymentCondition) -> Self {
        self.payment = payment;
        self
    }

    /// Credit sale due after a described term, e.g. "30 días".
    pub fn credit_term(mut self, term: impl Into<String>) -> Self {
        self.payment = PaymentCondition::Credit(CreditTerms {
            kind: CreditKind::Term(term.into()),
            down_payment: None,
        });
        self
    }

    /// Credit sale paid in installments.
    pub fn installments(mut self, installments: Vec<Installment>) -> Self {
        self.payment = PaymentCondition::Credit(CreditTerms {
            kind: CreditKind::Installments(installments),
            down_payment: None,
        });
        self
    }

    pub fn add_line(mut self, line: LineItem) -> Self {
        self.lines.push(line);
        self
    }

    pub fn sector(mut self, sector: SectorExtension) -> Self {
        self.sector = Some(sector);
        self
    }

    pub fn transport(mut self, transport: Transport) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn cargo(mut self, cargo: GeneralCargo) -> Self {
        self.cargo = Some(cargo);
        self
    }

    /// Build the invoice and run shape validation.
    /// Returns all validation errors (not just the first).
    pub fn build(self) -> Result<Invoice, SifenError> {
        let (invoice, mut errors) = self.assemble();
        match invoice {
            Some(invoice) => {
                errors.extend(validation::validate_invoice(&invoice));
                if errors.is_empty() {
                    Ok(invoice)
                } else {
                    Err(SifenError::Validation(errors))
                }
            }
            None => Err(SifenError::Validation(errors)),
        }
    }

    /// Build without shape validation, useful for importing external data.
    /// Required parts (number, stamp, parties, security code) must still be present.
    pub fn build_unchecked(self) -> Result<Invoice, SifenError> {
        match self.assemble() {
            (Some(invoice), _) => Ok(invoice),
            (None, errors) => Err(SifenError::Validation(errors)),
        }
    }

    fn assemble(self) -> (Option<Invoice>, Vec<ValidationError>) {
        let mut errors = Vec::new();

        let number = match DocumentNumber::parse(&self.number) {
            Ok(number) => Some(number),
            Err(SifenError::Validation(mut parse_errors)) => {
                errors.append(&mut parse_errors);
                None
            }
            Err(other) => {
                errors.push(ValidationError::new("number", other.to_string()));
                None
            }
        };
        if self.security_code.is_none() {
            errors.push(ValidationError::with_rule(
                "security_code",
                "security code is required",
                "dCodSeg",
            ));
        }
        if self.stamp.is_none() {
            errors.push(ValidationError::with_rule(
                "stamp",
                "stamp is required",
                "gTimb",
            ));
        }
        if self.issuer.is_none() {
            errors.push(ValidationError::with_rule(
                "issuer",
                "issuer is required",
                "gEmis",
            ));
        }
        if self.recipient.is_none() {
            errors.push(ValidationError::with_rule(
                "recipient",
                "recipient is required",
                "gDatRec",
            ));
        }

        let (Some(number), Some(security_code), Some(stamp), Some(issuer), Some(recipient)) = (
            number,
            self.security_code,
            self.stamp,
            self.issuer,
            self.recipient,
        ) else {
            return (None, errors);
        };

        let invoice = Invoice {
            emission_type: self.emission_type,
            security_code,
            issuer_info: self.issuer_info,
            fiscal_info: self.fiscal_info,
            stamp,
            number,
            issued_at: self.issued_at,
            transaction_type: self.transaction_type,
            tax_affected: self.tax_affected,
            currency: self.currency,
            exchange_rate: self.exchange_rate,
            advance_condition: self.advance_condition,
            issuer,
            recipient,
            presence: self.presence,
            payment: self.payment,
            lines: self.lines,
            sector: self.sector,
            transport: self.transport,
            cargo: self.cargo,
        };
        (Some(invoice), errors)
    }
}

/// Builder for the issuing taxpayer.
pub struct IssuerBuilder {
    ruc: String,
    check_digit: String,
    taxpayer_type: TaxpayerType,
    regime: Option<u8>,
    name: String,
    trade_name: Option<String>,
    address: Address,
    phone: String,
    email: String,
    branch: Option<String>,
    activities: Vec<String>,
    responsible: Option<Responsible>,
    sectors: SectorFlags,
}

impl IssuerBuilder {
    pub fn new(
        ruc: impl Into<String>,
        check_digit: impl Into<String>,
        name: impl Into<String>,
        address: Address,
    ) -> Self {
        Self {
            ruc: ruc.into(),
            check_digit: check_digit.into(),
            taxpayer_type: TaxpayerType::Natural,
            regime: None,
            name: name.into(),
            trade_name: None,
            address,
            phone: String::new(),
            email: String::new(),
            branch: None,
            activities: Vec::new(),
            responsible: None,
            sectors: SectorFlags::default(),
        }
    }

    pub fn taxpayer_type(mut self, kind: TaxpayerType) -> Self {
        self.taxpayer_type = kind;
        self
    }

    pub fn regime(mut self, code: u8) -> Self {
        self.regime = Some(code);
        self
    }

    pub fn trade_name(mut self, name: impl Into<String>) -> Self {
        self.trade_name = Some(name.into());
        self
    }

    pub fn phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = phone.into();
        self
    }

    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    pub fn branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    pub fn activity(mut self, code: impl Into<String>) -> Self {
        self.activities.push(code.into());
        self
    }

    pub fn responsible(
        mut self,
        document_type: u8,
        document_number: impl Into<String>,
        name: impl Into<String>,
        position: impl Into<String>,
    ) -> Self {
        self.responsible = Some(Responsible {
            document_type,
            document_number: document_number.into(),
            name: name.into(),
            position: position.into(),
        });
        self
    }

    pub fn sectors(mut self, sectors: SectorFlags) -> Self {
        self.sectors = sectors;
        self
    }

    pub fn build(self) -> Issuer {
        Issuer {
            ruc: self.ruc,
            check_digit: self.check_digit,
            taxpayer_type: self.taxpayer_type,
            regime: self.regime,
            name: self.name,
            trade_name: self.trade_name,
            address: self.address,
            phone: self.phone,
            email: self.email,
            branch: self.branch,
            activities: self.activities,
            responsible: self.responsible,
            sectors: self.sectors,
        }
    }
}

/// Builder for the receiving party.
pub struct RecipientBuilder {
    identity: RecipientIdentity,
    operation_type: u8,
    country: String,
    name: String,
    trade_name: Option<String>,
    address: Option<Address>,
    phone: Option<String>,
    mobile: Option<String>,
    email: Option<String>,
    customer_code: Option<String>,
}

impl RecipientBuilder {
    /// Recipient registered with RUC (B2B by default).
    pub fn taxpayer(
        ruc: impl Into<String>,
        check_digit: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self::with_identity(
            RecipientIdentity::Taxpayer {
                taxpayer_type: TaxpayerType::Legal,
                ruc: ruc.into(),
                check_digit: check_digit.into(),
            },
            1,
            name,
        )
    }

    /// Recipient identified by a personal document (B2C by default).
    pub fn non_taxpayer(
        document_type: u8,
        document_number: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self::with_identity(
            RecipientIdentity::NonTaxpayer {
                document_type,
                document_number: document_number.into(),
            },
            2,
            name,
        )
    }

    fn with_identity(identity: RecipientIdentity, operation_type: u8, name: impl Into<String>) -> Self {
        Self {
            identity,
            operation_type,
            country: "PRY".to_string(),
            name: name.into(),
            trade_name: None,
            address: None,
            phone: None,
            mobile: None,
            email: None,
            customer_code: None,
        }
    }

    /// Natural person or legal entity; only meaningful for taxpayers.
    pub fn taxpayer_type(mut self, kind: TaxpayerType) -> Self {
        if let RecipientIdentity::Taxpayer { taxpayer_type, .. } = &mut self.identity {
            *taxpayer_type = kind;
        }
        self
    }

    pub fn operation_type(mut self, code: u8) -> Self {
        self.operation_type = code;
        self
    }

    pub fn country(mut self, code: impl Into<String>) -> Self {
        self.country = code.into();
        self
    }

    pub fn trade_name(mut self, name: impl Into<String>) -> Self {
        self.trade_name = Some(name.into());
        self
    }

    pub fn address(mut self, address: Address) -> Self {
        self.address = Some(address);
        self
    }

    pub fn phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn mobile(mut self, mobile: impl Into<String>) -> Self {
        self.mobile = Some(mobile.into());
        self
    }

    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn customer_code(mut self, code: impl Into<String>) -> Self {
        self.customer_code = Some(code.into());
        self
    }

    pub fn build(self) -> Recipient {
        Recipient {
            identity: self.identity,
            operation_type: self.operation_type,
            country: self.country,
            name: self.name,
            trade_name: self.trade_name,
            address: self.address,
            phone: self.phone,
            mobile: self.mobile,
            email: self.email,
            customer_code: self.customer_code,
        }
    }
}

/// Builder for Address.
pub struct AddressBuilder {
    street: String,
    house_number: String,
    complement1: Option<String>,
    complement2: Option<String>,
    department: String,
    district: Option<String>,
    city: String,
}

impl AddressBuilder {
    pub fn new(
        street: impl Into<String>,
        house_number: impl Into<String>,
        department: impl Into<String>,
        city: impl Into<String>,
    ) -> Self {
        Self {
            street: street.into(),
            house_number: house_number.into(),
            complement1: None,
            complement2: None,
            department: department.into(),
            district: None,
            city: city.into(),
        }
    }

    pub fn complements(mut self, first: impl Into<String>, second: impl Into<String>) -> Self {
        self.complement1 = Some(first.into());
        self.complement2 = Some(second.into());
        self
    }

    pub fn district(mut self, code: impl Into<String>) -> Self {
        self.district = Some(code.into());
        self
    }

    pub fn build(self) -> Address {
        Address {
            street: self.street,
            house_number: self.house_number,
            complement1: self.complement1,
            complement2: self.complement2,
            department: self.department,
            district: self.district,
            city: self.city,
        }
    }
}

/// Builder for LineItem. Defaults to unit "77", 10 % IVA, fully taxed.
pub struct LineItemBuilder {
    line: LineItem,
}

impl LineItemBuilder {
    pub fn new(
        code: impl Into<String>,
        description: impl Into<String>,
        quantity: Decimal,
        unit_price: Decimal,
    ) -> Self {
        Self {
            line: LineItem {
                code: code.into(),
                description: description.into(),
                quantity,
                unit_price,
                unit: "77".to_string(),
                tax_rate: dec!(10),
                tax_treatment: 1,
                tax_proportion: dec!(100),
                discount: None,
                discount_percent: None,
                global_discount: None,
                tariff_heading: None,
                ncm: None,
                gtin: None,
                gtin_package: None,
                origin_country: None,
                extra_info: None,
                serial_number: None,
                lot_number: None,
                expiry: None,
            },
        }
    }

    pub fn unit(mut self, code: impl Into<String>) -> Self {
        self.line.unit = code.into();
        self
    }

    pub fn tax_rate(mut self, rate: Decimal) -> Self {
        self.line.tax_rate = rate;
        self
    }

    /// iAfecIVA treatment and the taxed proportion in percent.
    pub fn tax_treatment(mut self, treatment: u8, proportion: Decimal) -> Self {
        self.line.tax_treatment = treatment;
        self.line.tax_proportion = proportion;
        self
    }

    /// Exempt line: treatment 3 at 0 %.
    pub fn exempt(self) -> Self {
        self.tax_treatment(3, dec!(100)).tax_rate(Decimal::ZERO)
    }

    pub fn discount(mut self, amount: Decimal) -> Self {
        self.line.discount = Some(amount);
        self
    }

    pub fn discount_percent(mut self, percent: Decimal) -> Self {
        self.line.discount_percent = Some(percent);
        self
    }

    pub fn global_discount(mut self, amount: Decimal) -> Self {
        self.line.global_discount = Some(amount);
        self
    }

    pub fn tariff_heading(mut self, heading: impl Into<String>) -> Self {
        self.line.tariff_heading = Some(heading.into());
        self
    }

    pub fn ncm(mut self, ncm: impl Into<String>) -> Self {
        self.line.ncm = Some(ncm.into());
        self
    }

    pub fn gtin(mut self, gtin: impl Into<String>) -> Self {
        self.line.gtin = Some(gtin.into());
        self
    }

    pub fn gtin_package(mut self, gtin: impl Into<String>) -> Self {
        self.line.gtin_package = Some(gtin.into());
        self
    }

    pub fn origin_country(mut self, code: impl Into<String>) -> Self {
        self.line.origin_country = Some(code.into());
        self
    }

    pub fn extra_info(mut self, info: impl Into<String>) -> Self {
        self.line.extra_info = Some(info.into());
        self
    }

    pub fn serial_number(mut self, serial: impl Into<String>) -> Self {
        self.line.serial_number = Some(serial.into());
        self
    }

    pub fn lot_number(mut self, lot: impl Into<String>) -> Self {
        self.line.lot_number = Some(lot.into());
        self
    }

    pub fn expiry(mut self, date: impl Into<DateInput>) -> Self {
        self.line.expiry = Some(date.into());
        self
    }

    pub fn build(self) -> LineItem {
        self.line
    }
}
