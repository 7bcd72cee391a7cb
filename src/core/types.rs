use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::SifenError;
use super::numbering::DocumentNumber;

/// DE: Electronic invoice (Factura Electrónica), the aggregate root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    /// iTipEmi: 1 = normal, 2 = contingency.
    pub emission_type: u8,
    /// dCodSeg: 9-digit security code (zero-padded on output).
    pub security_code: String,
    /// dInfoEmi: free-text information from the issuer.
    pub issuer_info: Option<String>,
    /// dInfoFisc: free-text fiscal information.
    pub fiscal_info: Option<String>,
    /// gTimb: stamp (timbrado) authorizing the numbering range.
    pub stamp: Stamp,
    /// dEst / dPunExp / dNumDoc.
    pub number: DocumentNumber,
    /// dFeEmiDE: emission timestamp.
    pub issued_at: NaiveDateTime,
    /// iTipTra: transaction type (1–13).
    pub transaction_type: u8,
    /// iTImp: tax affected (1 = IVA, 2 = ISC, 3 = Renta, 4 = Ninguno, 5 = IVA - Renta).
    pub tax_affected: u8,
    /// cMoneOpe: ISO 4217 operation currency.
    pub currency: String,
    /// dCondTiCam / dTiCam: required when the currency is not PYG.
    pub exchange_rate: Option<ExchangeRate>,
    /// iCondAnt: advance condition (1 = global, 2 = per item).
    pub advance_condition: Option<u8>,
    /// gEmis.
    pub issuer: Issuer,
    /// gDatRec.
    pub recipient: Recipient,
    /// iIndPres: presence indicator (1–6, 9).
    pub presence: u8,
    /// gCamCond.
    pub payment: PaymentCondition,
    /// gCamItem: ordered, non-empty.
    pub lines: Vec<LineItem>,
    /// gCamEsp: at most one sector block, enabled by the issuer's sector flags.
    pub sector: Option<SectorExtension>,
    /// gTransp.
    pub transport: Option<Transport>,
    /// gCamGen: emitted only when all eight cargo fields are present.
    pub cargo: Option<GeneralCargo>,
}

/// gTimb: stamp data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stamp {
    /// dNumTim: 8-digit stamp number.
    pub number: String,
    /// dSerieNum: two-letter series.
    pub series: Option<String>,
    /// dFeIniT: first day the stamp is valid.
    pub valid_from: DateInput,
}

/// Exchange rate data for foreign-currency invoices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeRate {
    /// dCondTiCam: 1 = global, 2 = per item.
    pub condition: u8,
    /// dTiCam: rate against PYG.
    pub rate: Decimal,
}

/// gEmis: the issuing taxpayer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issuer {
    /// dRucEm: RUC without check digit.
    pub ruc: String,
    /// dDVEmi.
    pub check_digit: String,
    /// iTipCont.
    pub taxpayer_type: TaxpayerType,
    /// cTipReg: tax regime code.
    pub regime: Option<u8>,
    /// dNomEmi.
    pub name: String,
    /// dNomFanEmi.
    pub trade_name: Option<String>,
    pub address: Address,
    /// dTelEmi.
    pub phone: String,
    /// dEmailE.
    pub email: String,
    /// dDenSuc: branch name.
    pub branch: Option<String>,
    /// gActEco: economic activity codes.
    pub activities: Vec<String>,
    /// gRespDE.
    pub responsible: Option<Responsible>,
    /// Which sector-specific blocks this issuer may emit.
    pub sectors: SectorFlags,
}

/// Address decomposed into SIFEN geographic codes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    pub house_number: String,
    /// dCompDir1 / dCompDir2: emitted only when both are set.
    pub complement1: Option<String>,
    pub complement2: Option<String>,
    /// Department code (e.g. "1" = CAPITAL).
    pub department: String,
    pub district: Option<String>,
    pub city: String,
}

/// gRespDE: person responsible for generating the document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Responsible {
    /// iTipIDRespDE.
    pub document_type: u8,
    pub document_number: String,
    pub name: String,
    pub position: String,
}

/// Sector flags configured for an issuer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectorFlags {
    pub energy: bool,
    pub insurance: bool,
    pub supermarket: bool,
    pub transport: bool,
}

/// Natural person or legal entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaxpayerType {
    /// 1: Persona física.
    Natural,
    /// 2: Persona jurídica.
    Legal,
}

impl TaxpayerType {
    pub fn code(&self) -> u8 {
        match self {
            Self::Natural => 1,
            Self::Legal => 2,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::Natural),
            2 => Some(Self::Legal),
            _ => None,
        }
    }
}

/// gDatRec: the receiving party.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipient {
    pub identity: RecipientIdentity,
    /// iTiOpe: 1 = B2B, 2 = B2C, 3 = B2G, 4 = B2F.
    pub operation_type: u8,
    /// cPaisRec: ISO 3166-1 alpha-3.
    pub country: String,
    /// dNomRec.
    pub name: String,
    pub trade_name: Option<String>,
    pub address: Option<Address>,
    pub phone: Option<String>,
    pub mobile: Option<String>,
    pub email: Option<String>,
    /// dCodCliente.
    pub customer_code: Option<String>,
}

/// Identification of the recipient; the variant decides iNatRec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecipientIdentity {
    /// iNatRec = 1: registered taxpayer with RUC.
    Taxpayer {
        taxpayer_type: TaxpayerType,
        ruc: String,
        check_digit: String,
    },
    /// iNatRec = 2: identified by an identity document.
    NonTaxpayer {
        /// iTipIDRec (1–6, 9; 5 = innominado).
        document_type: u8,
        document_number: String,
    },
}

impl RecipientIdentity {
    /// iNatRec code.
    pub fn nature_code(&self) -> u8 {
        match self {
            Self::Taxpayer { .. } => 1,
            Self::NonTaxpayer { .. } => 2,
        }
    }
}

/// gCamItem: invoice line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    /// dCodInt: internal item code (max 20).
    pub code: String,
    /// dDesProSer.
    pub description: String,
    /// dCantProSer.
    pub quantity: Decimal,
    /// dPUniProSer.
    pub unit_price: Decimal,
    /// cUniMed: SIFEN unit code (77 = unit).
    pub unit: String,
    /// dTasaIVA: 0, 5 or 10.
    pub tax_rate: Decimal,
    /// iAfecIVA: 1 taxed, 2 exonerated, 3 exempt, 4 partially taxed.
    pub tax_treatment: u8,
    /// dPropIVA: taxed proportion in percent.
    pub tax_proportion: Decimal,
    /// dDescItem: absolute discount per line.
    pub discount: Option<Decimal>,
    /// dPorcDesIt: percentage discount on the line subtotal.
    pub discount_percent: Option<Decimal>,
    /// dDescGloItem: share of a global discount carried by this line.
    pub global_discount: Option<Decimal>,
    /// dParAranc.
    pub tariff_heading: Option<String>,
    /// dNCM.
    pub ncm: Option<String>,
    /// dGtin.
    pub gtin: Option<String>,
    /// dGtinPq.
    pub gtin_package: Option<String>,
    /// cPaisOrig.
    pub origin_country: Option<String>,
    /// dInfItem (max 500).
    pub extra_info: Option<String>,
    /// dNSerie.
    pub serial_number: Option<String>,
    /// dNumLote.
    pub lot_number: Option<String>,
    /// dVencMerc.
    pub expiry: Option<DateInput>,
}

/// gCamCond: sale condition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PaymentCondition {
    /// iCondOpe = 1.
    Cash,
    /// iCondOpe = 2.
    Credit(CreditTerms),
}

impl PaymentCondition {
    pub fn code(&self) -> u8 {
        match self {
            Self::Cash => 1,
            Self::Credit(_) => 2,
        }
    }
}

/// gPagCred.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditTerms {
    pub kind: CreditKind,
    /// dMonEnt: down payment.
    pub down_payment: Option<Decimal>,
}

/// iCondCred.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CreditKind {
    /// 1: term, described as free text (e.g. "30 días").
    Term(String),
    /// 2: installment plan.
    Installments(Vec<Installment>),
}

impl CreditKind {
    pub fn code(&self) -> u8 {
        match self {
            Self::Term(_) => 1,
            Self::Installments(_) => 2,
        }
    }
}

/// gCuotas.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Installment {
    pub number: u32,
    /// dMonCuota: 4-decimal precision.
    pub amount: Decimal,
    /// cMoneCuo.
    pub currency: String,
    /// dVencCuo.
    pub due_date: Option<DateInput>,
}

/// gCamEsp: sector-specific block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SectorExtension {
    Energy(EnergyData),
    Insurance(InsuranceData),
    Supermarket(SupermarketData),
}

impl SectorExtension {
    pub fn is_enabled_by(&self, flags: &SectorFlags) -> bool {
        match self {
            Self::Energy(_) => flags.energy,
            Self::Insurance(_) => flags.insurance,
            Self::Supermarket(_) => flags.supermarket,
        }
    }
}

/// gGrupEner.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnergyData {
    pub meter_number: Option<String>,
    pub activity_code: Option<String>,
    pub category: Option<String>,
    pub previous_reading: Option<Decimal>,
    pub current_reading: Option<Decimal>,
    pub consumption_kwh: Option<Decimal>,
}

/// gGrupSeg.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsuranceData {
    /// dCodEmpSeg: company code at the insurance superintendence.
    pub company_code: String,
    pub policies: Vec<InsurancePolicy>,
}

/// gGrupPolSeg.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsurancePolicy {
    pub number: String,
    pub validity_unit: String,
    pub validity: String,
    pub full_number: Option<String>,
    pub starts: Option<DateInput>,
    pub ends: Option<DateInput>,
    pub internal_code: Option<String>,
}

/// gGrupSup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SupermarketData {
    pub cashier: Option<String>,
    pub cash: Option<Decimal>,
    pub change: Option<Decimal>,
    pub donation: Option<Decimal>,
    pub donation_description: Option<String>,
}

/// gTransp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transport {
    /// iTipTrans: 1 = own, 2 = third party.
    pub kind: u8,
    /// iModTrans: 1 land, 2 river, 3 air, 4 multimodal.
    pub mode: u8,
    /// iRespFlete: party paying the freight (1–5).
    pub freight_payer: u8,
    /// cCondNeg: Incoterm.
    pub incoterm: Option<String>,
    pub manifest: Option<String>,
    pub import_dispatch: Option<String>,
    pub starts: Option<DateInput>,
    pub ends: Option<DateInput>,
    pub destination_country: Option<String>,
    /// gCamSal.
    pub departure: Option<TransportPoint>,
    /// gCamEnt.
    pub delivery: Option<TransportPoint>,
    /// gVehTras: up to 4 vehicles.
    pub vehicles: Vec<Vehicle>,
    /// gCamTrans.
    pub carrier: Option<Carrier>,
}

/// Departure or delivery location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportPoint {
    pub address: String,
    pub house_number: String,
    pub department: String,
    pub district: Option<String>,
    pub city: String,
    pub phone: Option<String>,
}

/// gVehTras.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    pub kind: String,
    pub brand: String,
    /// dTipIdenVeh: 1 = chassis number, 2 = engine number.
    pub id_type: u8,
    pub id_number: Option<String>,
    pub plate: Option<String>,
    pub flight: Option<String>,
}

/// gCamTrans.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Carrier {
    pub name: String,
    pub identity: CarrierIdentity,
    pub driver_id: String,
    pub driver_name: String,
    pub fiscal_address: Option<String>,
}

/// iNatTrans discriminator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CarrierIdentity {
    /// 1: carrier registered with RUC.
    Taxpayer { ruc: String, check_digit: String },
    /// 2: carrier identified by document.
    NonTaxpayer {
        document_type: u8,
        document_number: String,
        nationality: Option<String>,
    },
}

impl CarrierIdentity {
    pub fn nature_code(&self) -> u8 {
        match self {
            Self::Taxpayer { .. } => 1,
            Self::NonTaxpayer { .. } => 2,
        }
    }
}

/// gCamGen / gCamCarg source fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneralCargo {
    pub purchase_order: Option<String>,
    pub sales_order: Option<String>,
    pub accounting_entry: Option<String>,
    pub volume_unit: Option<String>,
    pub total_volume: Option<String>,
    pub weight_unit: Option<String>,
    pub total_weight: Option<String>,
    /// iCarCarga: 1 cold chain, 2 dangerous goods, 3 other.
    pub characteristic: Option<String>,
}

/// Invoice totals (gTotSub), always derived from the lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    /// dSubExe: base of exempt lines.
    pub exempt: Decimal,
    /// dSubExo: base of exonerated lines.
    pub exonerated: Decimal,
    /// dSub5: taxed base at 5 %.
    pub subtotal_5: Decimal,
    /// dSub10: taxed base at 10 %.
    pub subtotal_10: Decimal,
    /// dTotOpe: sum of line subtotals before discounts.
    pub subtotal: Decimal,
    /// dTotDesc: line discounts (absolute + percentage).
    pub discounts: Decimal,
    /// dTotDescGlotem: global discounts carried by lines.
    pub global_discounts: Decimal,
    /// dIVA5.
    pub tax_5: Decimal,
    /// dIVA10.
    pub tax_10: Decimal,
    /// dTotIVA.
    pub tax_total: Decimal,
    /// dBaseGrav5.
    pub base_5: Decimal,
    /// dBaseGrav10.
    pub base_10: Decimal,
    /// dTotGralOpe: taxable bases plus tax.
    pub grand_total: Decimal,
}

impl Totals {
    /// dTBasGraIVA.
    pub fn taxable_base(&self) -> Decimal {
        self.base_5 + self.base_10
    }

    /// dDescTotal.
    pub fn all_discounts(&self) -> Decimal {
        self.discounts + self.global_discounts
    }
}

/// A date as supplied by the caller: a date, a timestamp, or text in
/// `%Y-%m-%dT%H:%M:%S` / `%Y-%m-%d`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateInput {
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Text(String),
}

impl DateInput {
    /// Normalize to a calendar date. Unrecognized text is a format error naming the value.
    pub fn to_date(&self) -> Result<NaiveDate, SifenError> {
        match self {
            Self::Date(d) => Ok(*d),
            Self::DateTime(dt) => Ok(dt.date()),
            Self::Text(s) => NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
                .map(|dt| dt.date())
                .or_else(|_| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
                .map_err(|_| {
                    tracing::warn!(value = %s, "unrecognized date input");
                    SifenError::format(s.as_str(), "unrecognized date format")
                }),
        }
    }

    /// Normalize to a timestamp; bare dates become midnight.
    pub fn to_datetime(&self) -> Result<NaiveDateTime, SifenError> {
        match self {
            Self::DateTime(dt) => Ok(*dt),
            Self::Text(s) => match NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
                Ok(dt) => Ok(dt),
                Err(_) => self.to_date().map(|d| d.and_time(NaiveTime::MIN)),
            },
            Self::Date(d) => Ok(d.and_time(NaiveTime::MIN)),
        }
    }
}

impl From<NaiveDate> for DateInput {
    fn from(d: NaiveDate) -> Self {
        Self::Date(d)
    }
}

impl From<NaiveDateTime> for DateInput {
    fn from(dt: NaiveDateTime) -> Self {
        Self::DateTime(dt)
    }
}

impl From<&str> for DateInput {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for DateInput {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_input_shapes() {
        let d = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        assert_eq!(DateInput::from(d).to_date().unwrap(), d);
        assert_eq!(
            DateInput::from(d.and_hms_opt(13, 5, 0).unwrap())
                .to_date()
                .unwrap(),
            d
        );
        assert_eq!(DateInput::from("2025-06-01").to_date().unwrap(), d);
        assert_eq!(DateInput::from("2025-06-01T23:59:59").to_date().unwrap(), d);
    }

    #[test]
    fn datetime_input_defaults_to_midnight() {
        let d = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        assert_eq!(
            DateInput::from("2025-06-01").to_datetime().unwrap(),
            d.and_hms_opt(0, 0, 0).unwrap()
        );
        assert_eq!(
            DateInput::from("2025-06-01T08:15:00").to_datetime().unwrap(),
            d.and_hms_opt(8, 15, 0).unwrap()
        );
        assert!(DateInput::from("June 1st").to_datetime().is_err());
    }

    #[test]
    fn date_input_rejects_other_patterns() {
        let err = DateInput::from("01/06/2025").to_date().unwrap_err();
        match err {
            SifenError::Format { value, .. } => assert_eq!(value, "01/06/2025"),
            other => panic!("expected format error, got {other:?}"),
        }
    }

    #[test]
    fn recipient_nature_codes() {
        let taxpayer = RecipientIdentity::Taxpayer {
            taxpayer_type: TaxpayerType::Legal,
            ruc: "80012345".into(),
            check_digit: "1".into(),
        };
        let other = RecipientIdentity::NonTaxpayer {
            document_type: 1,
            document_number: "1234567".into(),
        };
        assert_eq!(taxpayer.nature_code(), 1);
        assert_eq!(other.nature_code(), 2);
    }
}
