use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

use super::codes;
use super::countries::is_known_country_code;
use super::currencies::is_known_currency_code;
use super::error::ValidationError;
use super::numbering::pad_digits;
use super::types::*;

/// Maximum number of installments in a credit plan (dCuotas).
pub const MAX_INSTALLMENTS: usize = 999;

/// Maximum number of item lines in one document.
pub const MAX_LINES: usize = 999;

/// Maximum number of vehicles in a transport block (gVehTras).
pub const MAX_VEHICLES: usize = 4;

/// Integer digits allowed for quantities (tCantidad: 14 total, 4 fraction).
const QUANTITY_INTEGER_DIGITS: u32 = 10;

/// Integer digits allowed for amounts (tMonto: 23 total, 8 fraction).
const AMOUNT_INTEGER_DIGITS: u32 = 15;

/// True when the integer part of `value` fits in `digits` digits.
fn fits_integer_digits(value: Decimal, digits: u32) -> bool {
    value.abs().trunc() < Decimal::from(10u64.pow(digits))
}

/// Round `value` to `dp` decimal places, half away from zero.
///
/// Re-quantizing an already quantized value returns it unchanged.
pub fn quantize(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

/// Percentage expressed as a 4-decimal factor (10 → 0.1000).
fn rate_factor(percent: Decimal) -> Decimal {
    quantize(percent / dec!(100), 4)
}

fn is_taxed(treatment: u8) -> bool {
    matches!(treatment, 1 | 4)
}

impl LineItem {
    /// dTotBruOpeItem: quantity × unit price.
    ///
    /// Saturates instead of overflowing; validation rejects magnitudes
    /// that could reach that point.
    pub fn subtotal(&self) -> Decimal {
        quantize(self.quantity.saturating_mul(self.unit_price), 2)
    }

    /// Discount derived from `discount_percent` over the subtotal.
    pub fn percent_discount(&self) -> Decimal {
        match self.discount_percent {
            Some(percent) => quantize(self.subtotal().saturating_mul(rate_factor(percent)), 2),
            None => Decimal::ZERO,
        }
    }

    /// Absolute plus percentage discount of this line.
    pub fn line_discount(&self) -> Decimal {
        self.discount
            .unwrap_or(Decimal::ZERO)
            .saturating_add(self.percent_discount())
    }

    /// Base after every discount, before tax.
    pub fn net_amount(&self) -> Decimal {
        quantize(
            self.subtotal()
                .saturating_sub(self.line_discount())
                .saturating_sub(self.global_discount.unwrap_or(Decimal::ZERO)),
            2,
        )
    }

    /// dBasGravIVA: taxed share of the net amount.
    pub fn taxable_base(&self) -> Decimal {
        if is_taxed(self.tax_treatment) {
            quantize(self.net_amount().saturating_mul(rate_factor(self.tax_proportion)), 2)
        } else {
            Decimal::ZERO
        }
    }

    /// dLiqIVAItem.
    pub fn tax_amount(&self) -> Decimal {
        quantize(self.taxable_base().saturating_mul(rate_factor(self.tax_rate)), 2)
    }

    /// dTotOpeItem: net amount plus tax.
    pub fn total(&self) -> Decimal {
        self.net_amount().saturating_add(self.tax_amount())
    }
}

/// Aggregate per-rate buckets, discounts and tax over all lines.
pub fn calculate_totals(lines: &[LineItem]) -> Totals {
    let mut totals = Totals {
        exempt: Decimal::ZERO,
        exonerated: Decimal::ZERO,
        subtotal_5: Decimal::ZERO,
        subtotal_10: Decimal::ZERO,
        subtotal: Decimal::ZERO,
        discounts: Decimal::ZERO,
        global_discounts: Decimal::ZERO,
        tax_5: Decimal::ZERO,
        tax_10: Decimal::ZERO,
        tax_total: Decimal::ZERO,
        base_5: Decimal::ZERO,
        base_10: Decimal::ZERO,
        grand_total: Decimal::ZERO,
    };

    let mut net_total = Decimal::ZERO;
    for line in lines {
        let net = line.net_amount();
        let base = line.taxable_base();
        let tax = line.tax_amount();

        totals.subtotal += line.subtotal();
        totals.discounts += line.line_discount();
        totals.global_discounts += line.global_discount.unwrap_or(Decimal::ZERO);
        net_total += net;

        match line.tax_treatment {
            2 => totals.exonerated += net,
            3 => totals.exempt += net,
            // Partially taxed lines put their untaxed share in the exempt bucket.
            _ => totals.exempt += net - base,
        }

        if line.tax_rate == dec!(5) {
            totals.subtotal_5 += base;
            totals.base_5 += base;
            totals.tax_5 += tax;
        } else if line.tax_rate == dec!(10) {
            totals.subtotal_10 += base;
            totals.base_10 += base;
            totals.tax_10 += tax;
        }
    }

    totals.tax_total = totals.tax_5 + totals.tax_10;
    totals.grand_total = net_total + totals.tax_total;
    totals
}

impl Invoice {
    /// Totals recomputed from the current lines.
    pub fn totals(&self) -> Totals {
        calculate_totals(&self.lines)
    }
}

/// Validate the shape of an invoice.
/// Returns all validation errors found (not just the first).
pub fn validate_invoice(invoice: &Invoice) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if !matches!(invoice.emission_type, 1 | 2) {
        errors.push(ValidationError::with_rule(
            "emission_type",
            format!("unknown emission type {}", invoice.emission_type),
            "iTipEmi",
        ));
    }

    if let Err(reason) = pad_digits(&invoice.security_code, 9) {
        errors.push(ValidationError::with_rule(
            "security_code",
            format!("security code {reason}"),
            "dCodSeg",
        ));
    }

    validate_stamp(&invoice.stamp, &mut errors);

    if !codes::is_known_transaction_type(invoice.transaction_type) {
        errors.push(ValidationError::with_rule(
            "transaction_type",
            format!("unknown transaction type {}", invoice.transaction_type),
            "iTipTra",
        ));
    }
    if codes::describe_tax_affected(invoice.tax_affected).is_empty() {
        errors.push(ValidationError::with_rule(
            "tax_affected",
            format!("unknown tax type {}", invoice.tax_affected),
            "iTImp",
        ));
    }
    if !codes::is_known_presence(invoice.presence) {
        errors.push(ValidationError::with_rule(
            "presence",
            format!("unknown presence indicator {}", invoice.presence),
            "iIndPres",
        ));
    }
    if let Some(advance) = invoice.advance_condition {
        if !matches!(advance, 1 | 2) {
            errors.push(ValidationError::with_rule(
                "advance_condition",
                format!("unknown advance condition {advance}"),
                "iCondAnt",
            ));
        }
    }

    validate_currency(invoice, &mut errors);
    validate_issuer(&invoice.issuer, &mut errors);
    validate_recipient(&invoice.recipient, &mut errors);
    validate_payment(&invoice.payment, &mut errors);

    if invoice.lines.is_empty() {
        errors.push(ValidationError::with_rule(
            "lines",
            "invoice must have at least one line item",
            "gCamItem",
        ));
    } else if invoice.lines.len() > MAX_LINES {
        errors.push(ValidationError::with_rule(
            "lines",
            format!("invoice cannot have more than {MAX_LINES} line items"),
            "gCamItem",
        ));
    }
    for (i, line) in invoice.lines.iter().enumerate() {
        validate_line(line, i, &mut errors);
    }

    if let Some(sector) = &invoice.sector {
        validate_sector(sector, &invoice.issuer.sectors, &mut errors);
    }
    if let Some(transport) = &invoice.transport {
        if !invoice.issuer.sectors.transport {
            errors.push(ValidationError::with_rule(
                "transport",
                "transport data requires the issuer's transport sector flag",
                "gTransp",
            ));
        }
        validate_transport(transport, &mut errors);
    }

    errors
}

fn validate_stamp(stamp: &Stamp, errors: &mut Vec<ValidationError>) {
    if let Err(reason) = pad_digits(stamp.number.trim(), 8) {
        errors.push(ValidationError::with_rule(
            "stamp.number",
            format!("stamp number {reason}"),
            "dNumTim",
        ));
    }
    if let Some(series) = &stamp.series {
        if series.len() != 2 || !series.bytes().all(|b| b.is_ascii_uppercase()) {
            errors.push(ValidationError::with_rule(
                "stamp.series",
                format!("series '{series}' must be two uppercase letters"),
                "dSerieNum",
            ));
        }
    }
}

fn validate_currency(invoice: &Invoice, errors: &mut Vec<ValidationError>) {
    if !is_known_currency_code(&invoice.currency) {
        errors.push(ValidationError::with_rule(
            "currency",
            format!("currency code '{}' is not a known ISO 4217 code", invoice.currency),
            "cMoneOpe",
        ));
    }

    match (&invoice.exchange_rate, invoice.currency == "PYG") {
        (None, false) => errors.push(ValidationError::with_rule(
            "exchange_rate",
            "foreign currency invoices require an exchange rate",
            "dTiCam",
        )),
        (Some(_), true) => errors.push(ValidationError::with_rule(
            "exchange_rate",
            "exchange rate is only allowed for foreign currency invoices",
            "dTiCam",
        )),
        (Some(rate), false) => {
            if !matches!(rate.condition, 1 | 2) {
                errors.push(ValidationError::with_rule(
                    "exchange_rate.condition",
                    format!("unknown exchange condition {}", rate.condition),
                    "dCondTiCam",
                ));
            }
            if rate.rate <= Decimal::ZERO {
                errors.push(ValidationError::with_rule(
                    "exchange_rate.rate",
                    "exchange rate must be positive",
                    "dTiCam",
                ));
            }
        }
        (None, true) => {}
    }
}

fn validate_ruc(
    ruc: &str,
    check_digit: &str,
    prefix: &str,
    rule: &str,
    errors: &mut Vec<ValidationError>,
) {
    if let Err(reason) = pad_digits(ruc.trim(), 8) {
        errors.push(ValidationError::with_rule(
            format!("{prefix}.ruc"),
            format!("RUC {reason}"),
            rule,
        ));
    }
    if check_digit.len() != 1 || !check_digit.bytes().all(|b| b.is_ascii_digit()) {
        errors.push(ValidationError::new(
            format!("{prefix}.check_digit"),
            "check digit must be a single digit",
        ));
    }
}

fn validate_address(address: &Address, prefix: &str, errors: &mut Vec<ValidationError>) {
    if address.street.trim().is_empty() {
        errors.push(ValidationError::new(
            format!("{prefix}.street"),
            "street must not be empty",
        ));
    }
    for (field, code) in [
        ("department", Some(&address.department)),
        ("district", address.district.as_ref()),
        ("city", Some(&address.city)),
    ] {
        if let Some(code) = code {
            if code.is_empty() || !code.bytes().all(|b| b.is_ascii_digit()) {
                errors.push(ValidationError::new(
                    format!("{prefix}.{field}"),
                    format!("{field} code '{code}' must be numeric"),
                ));
            }
        }
    }
}

fn validate_email(email: &str, field: &str, errors: &mut Vec<ValidationError>) {
    let valid = match email.trim().split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    };
    if !valid {
        errors.push(ValidationError::new(
            field,
            format!("'{email}' is not a valid email address"),
        ));
    }
}

fn validate_issuer(issuer: &Issuer, errors: &mut Vec<ValidationError>) {
    validate_ruc(&issuer.ruc, &issuer.check_digit, "issuer", "dRucEm", errors);

    if issuer.name.trim().is_empty() {
        errors.push(ValidationError::with_rule(
            "issuer.name",
            "issuer name must not be empty",
            "dNomEmi",
        ));
    }
    validate_address(&issuer.address, "issuer.address", errors);

    if issuer.phone.trim().is_empty() {
        errors.push(ValidationError::with_rule(
            "issuer.phone",
            "issuer phone must not be empty",
            "dTelEmi",
        ));
    }
    validate_email(&issuer.email, "issuer.email", errors);

    if issuer.activities.is_empty() || issuer.activities.len() > 9 {
        errors.push(ValidationError::with_rule(
            "issuer.activities",
            "issuer must declare between 1 and 9 economic activities",
            "gActEco",
        ));
    }

    if let Some(responsible) = &issuer.responsible {
        if codes::describe_identity_document(responsible.document_type).is_empty() {
            errors.push(ValidationError::with_rule(
                "issuer.responsible.document_type",
                format!("unknown document type {}", responsible.document_type),
                "iTipIDRespDE",
            ));
        }
        if responsible.document_number.trim().is_empty() || responsible.name.trim().is_empty() {
            errors.push(ValidationError::with_rule(
                "issuer.responsible",
                "responsible party needs a document number and a name",
                "gRespDE",
            ));
        }
    }
}

fn validate_recipient(recipient: &Recipient, errors: &mut Vec<ValidationError>) {
    match &recipient.identity {
        RecipientIdentity::Taxpayer {
            ruc, check_digit, ..
        } => validate_ruc(ruc, check_digit, "recipient", "dRucRec", errors),
        RecipientIdentity::NonTaxpayer {
            document_type,
            document_number,
        } => {
            if codes::describe_recipient_document(*document_type).is_empty() {
                errors.push(ValidationError::with_rule(
                    "recipient.document_type",
                    format!("unknown document type {document_type}"),
                    "iTipIDRec",
                ));
            }
            if document_number.trim().is_empty() {
                errors.push(ValidationError::with_rule(
                    "recipient.document_number",
                    "non-taxpayer recipients need a document number",
                    "dNumIDRec",
                ));
            }
        }
    }

    if !(1..=4).contains(&recipient.operation_type) {
        errors.push(ValidationError::with_rule(
            "recipient.operation_type",
            format!("unknown operation type {}", recipient.operation_type),
            "iTiOpe",
        ));
    }
    if !is_known_country_code(&recipient.country) {
        errors.push(ValidationError::with_rule(
            "recipient.country",
            format!("'{}' is not a known alpha-3 country code", recipient.country),
            "cPaisRec",
        ));
    }
    if recipient.name.trim().is_empty() {
        errors.push(ValidationError::with_rule(
            "recipient.name",
            "recipient name must not be empty",
            "dNomRec",
        ));
    }
    if let Some(address) = &recipient.address {
        validate_address(address, "recipient.address", errors);
    }
    if let Some(email) = &recipient.email {
        validate_email(email, "recipient.email", errors);
    }
}

fn validate_payment(payment: &PaymentCondition, errors: &mut Vec<ValidationError>) {
    let PaymentCondition::Credit(terms) = payment else {
        return;
    };

    match &terms.kind {
        CreditKind::Term(days) => {
            if days.trim().is_empty() {
                errors.push(ValidationError::with_rule(
                    "payment.term",
                    "credit by term needs a term description",
                    "dPlazoCre",
                ));
            }
        }
        CreditKind::Installments(installments) => {
            if installments.is_empty() {
                errors.push(ValidationError::with_rule(
                    "payment.installments",
                    "credit by installments needs at least one installment",
                    "gCuotas",
                ));
            }
            if installments.len() > MAX_INSTALLMENTS {
                errors.push(ValidationError::with_rule(
                    "payment.installments",
                    format!(
                        "{} installments exceed the maximum of {MAX_INSTALLMENTS}",
                        installments.len()
                    ),
                    "dCuotas",
                ));
            }
            for (i, installment) in installments.iter().enumerate() {
                if installment.amount < Decimal::ZERO {
                    errors.push(ValidationError::with_rule(
                        format!("payment.installments[{i}].amount"),
                        "installment amount must not be negative",
                        "dMonCuota",
                    ));
                }
                if !is_known_currency_code(&installment.currency) {
                    errors.push(ValidationError::with_rule(
                        format!("payment.installments[{i}].currency"),
                        format!("unknown currency '{}'", installment.currency),
                        "cMoneCuo",
                    ));
                }
            }
        }
    }

    if let Some(amount) = terms.down_payment {
        if amount < Decimal::ZERO {
            errors.push(ValidationError::with_rule(
                "payment.down_payment",
                "down payment must not be negative",
                "dMonEnt",
            ));
        }
    }
}

fn validate_line(line: &LineItem, index: usize, errors: &mut Vec<ValidationError>) {
    let prefix = format!("lines[{index}]");

    if line.code.trim().is_empty() || line.code.chars().count() > 20 {
        errors.push(ValidationError::with_rule(
            format!("{prefix}.code"),
            "item code is required (max 20 characters)",
            "dCodInt",
        ));
    }
    if line.description.trim().is_empty() {
        errors.push(ValidationError::with_rule(
            format!("{prefix}.description"),
            "item description must not be empty",
            "dDesProSer",
        ));
    }
    if line.quantity <= Decimal::ZERO {
        errors.push(ValidationError::with_rule(
            format!("{prefix}.quantity"),
            "quantity must be greater than zero",
            "dCantProSer",
        ));
    }
    if line.unit_price <= Decimal::ZERO {
        errors.push(ValidationError::with_rule(
            format!("{prefix}.unit_price"),
            "unit price must be greater than zero",
            "dPUniProSer",
        ));
    }

    let mut in_range = true;
    for (field, value, digits, rule) in [
        ("quantity", Some(line.quantity), QUANTITY_INTEGER_DIGITS, "dCantProSer"),
        ("unit_price", Some(line.unit_price), AMOUNT_INTEGER_DIGITS, "dPUniProSer"),
        ("discount", line.discount, AMOUNT_INTEGER_DIGITS, "dDescItem"),
        ("global_discount", line.global_discount, AMOUNT_INTEGER_DIGITS, "dDescGloItem"),
    ] {
        if value.is_some_and(|v| !fits_integer_digits(v, digits)) {
            in_range = false;
            errors.push(ValidationError::with_rule(
                format!("{prefix}.{field}"),
                format!("{field} exceeds {digits} integer digits"),
                rule,
            ));
        }
    }
    if line.unit.trim().is_empty() {
        errors.push(ValidationError::with_rule(
            format!("{prefix}.unit"),
            "unit of measure must not be empty",
            "cUniMed",
        ));
    }

    let rate_known = [dec!(0), dec!(5), dec!(10)].contains(&line.tax_rate);
    if !rate_known {
        errors.push(ValidationError::with_rule(
            format!("{prefix}.tax_rate"),
            format!("tax rate {} must be 0, 5 or 10", line.tax_rate),
            "dTasaIVA",
        ));
    }
    if !codes::is_known_tax_treatment(line.tax_treatment) {
        errors.push(ValidationError::with_rule(
            format!("{prefix}.tax_treatment"),
            format!("unknown tax treatment {}", line.tax_treatment),
            "iAfecIVA",
        ));
    } else if rate_known && is_taxed(line.tax_treatment) == line.tax_rate.is_zero() {
        errors.push(ValidationError::with_rule(
            format!("{prefix}.tax_rate"),
            "taxed lines need a 5 or 10 rate, exempt and exonerated lines a 0 rate",
            "dTasaIVA",
        ));
    }
    if line.tax_proportion <= Decimal::ZERO || line.tax_proportion > dec!(100) {
        errors.push(ValidationError::with_rule(
            format!("{prefix}.tax_proportion"),
            "tax proportion must be within (0, 100]",
            "dPropIVA",
        ));
    }

    for (field, value) in [
        ("discount", line.discount),
        ("global_discount", line.global_discount),
    ] {
        if value.is_some_and(|v| v < Decimal::ZERO) {
            errors.push(ValidationError::new(
                format!("{prefix}.{field}"),
                "discount must not be negative",
            ));
        }
    }
    if let Some(percent) = line.discount_percent {
        if percent <= Decimal::ZERO || percent > dec!(100) {
            errors.push(ValidationError::with_rule(
                format!("{prefix}.discount_percent"),
                "discount percentage must be within (0, 100]",
                "dPorcDesIt",
            ));
        }
    }
    if in_range
        && line.quantity > Decimal::ZERO
        && line.unit_price > Decimal::ZERO
        && line.net_amount() < Decimal::ZERO
    {
        errors.push(ValidationError::with_rule(
            format!("{prefix}.discount"),
            "discounts exceed the line subtotal",
            "dTotOpeItem",
        ));
    }
    if line.gtin.as_ref().is_some_and(|g| g.chars().count() > 20) {
        errors.push(ValidationError::with_rule(
            format!("{prefix}.gtin"),
            "GTIN cannot exceed 20 characters",
            "dGtin",
        ));
    }
}

fn validate_sector(
    sector: &SectorExtension,
    flags: &SectorFlags,
    errors: &mut Vec<ValidationError>,
) {
    if !sector.is_enabled_by(flags) {
        errors.push(ValidationError::with_rule(
            "sector",
            "sector block is not enabled by the issuer's sector flags",
            "gCamEsp",
        ));
    }

    match sector {
        SectorExtension::Energy(energy) => {
            if let Some(code) = &energy.activity_code {
                if !code.bytes().all(|b| b.is_ascii_digit()) {
                    errors.push(ValidationError::with_rule(
                        "sector.energy.activity_code",
                        "activity code must be numeric",
                        "dActiv",
                    ));
                }
            }
        }
        SectorExtension::Insurance(insurance) => {
            if insurance.company_code.trim().is_empty() {
                errors.push(ValidationError::with_rule(
                    "sector.insurance.company_code",
                    "insurance company code is required",
                    "dCodEmpSeg",
                ));
            }
            if insurance.policies.is_empty() {
                errors.push(ValidationError::with_rule(
                    "sector.insurance.policies",
                    "at least one policy is required",
                    "gGrupPolSeg",
                ));
            }
            for (i, policy) in insurance.policies.iter().enumerate() {
                if policy.number.trim().is_empty()
                    || policy.validity_unit.trim().is_empty()
                    || policy.validity.trim().is_empty()
                {
                    errors.push(ValidationError::with_rule(
                        format!("sector.insurance.policies[{i}]"),
                        "policy number, validity unit and validity are required",
                        "dPoliza",
                    ));
                }
            }
        }
        SectorExtension::Supermarket(market) => {
            for (field, value) in [
                ("cash", market.cash),
                ("change", market.change),
                ("donation", market.donation),
            ] {
                if value.is_some_and(|v| v < Decimal::ZERO) {
                    errors.push(ValidationError::new(
                        format!("sector.supermarket.{field}"),
                        "amount must not be negative",
                    ));
                }
            }
        }
    }
}

fn validate_transport(transport: &Transport, errors: &mut Vec<ValidationError>) {
    if codes::describe_transport_kind(transport.kind).is_empty() {
        errors.push(ValidationError::with_rule(
            "transport.kind",
            format!("unknown transport type {}", transport.kind),
            "iTipTrans",
        ));
    }
    if codes::describe_transport_mode(transport.mode).is_empty() {
        errors.push(ValidationError::with_rule(
            "transport.mode",
            format!("unknown transport mode {}", transport.mode),
            "iModTrans",
        ));
    }
    if !(1..=5).contains(&transport.freight_payer) {
        errors.push(ValidationError::with_rule(
            "transport.freight_payer",
            format!("unknown freight responsible {}", transport.freight_payer),
            "iRespFlete",
        ));
    }
    if transport.vehicles.len() > MAX_VEHICLES {
        errors.push(ValidationError::with_rule(
            "transport.vehicles",
            format!("transport cannot list more than {MAX_VEHICLES} vehicles"),
            "gVehTras",
        ));
    }
    for (i, vehicle) in transport.vehicles.iter().enumerate() {
        if vehicle.kind.trim().is_empty() || vehicle.brand.trim().is_empty() {
            errors.push(ValidationError::with_rule(
                format!("transport.vehicles[{i}]"),
                "vehicle type and brand are required",
                "dTiVehTras",
            ));
        }
        if !matches!(vehicle.id_type, 1 | 2) {
            errors.push(ValidationError::with_rule(
                format!("transport.vehicles[{i}].id_type"),
                "identification type must be 1 (chassis) or 2 (engine)",
                "dTipIdenVeh",
            ));
        }
    }

    if let Some(carrier) = &transport.carrier {
        if carrier.name.trim().is_empty() {
            errors.push(ValidationError::with_rule(
                "transport.carrier.name",
                "carrier name is required",
                "dNomTrans",
            ));
        }
        match &carrier.identity {
            CarrierIdentity::Taxpayer { ruc, check_digit } => {
                validate_ruc(ruc, check_digit, "transport.carrier", "dRucTrans", errors)
            }
            CarrierIdentity::NonTaxpayer {
                document_type,
                document_number,
                ..
            } => {
                if codes::describe_identity_document(*document_type).is_empty() {
                    errors.push(ValidationError::with_rule(
                        "transport.carrier.document_type",
                        format!("unknown document type {document_type}"),
                        "iTipIDTrans",
                    ));
                }
                if document_number.trim().is_empty() {
                    errors.push(ValidationError::with_rule(
                        "transport.carrier.document_number",
                        "carrier document number is required",
                        "dNumIDTrans",
                    ));
                }
            }
        }
        if carrier.driver_id.trim().is_empty() || carrier.driver_name.trim().is_empty() {
            errors.push(ValidationError::with_rule(
                "transport.carrier.driver",
                "driver identification and name are required",
                "dNumIDChof",
            ));
        }
    }
}
