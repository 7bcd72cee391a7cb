//! Presence predicates for the optional groups.

use crate::core::{
    CreditKind, GeneralCargo, Installment, Invoice, LineItem, PaymentCondition, SectorExtension,
    Transport,
};

/// gCuotas: the installment list of a credit-by-installments sale, if non-empty.
pub fn installments(invoice: &Invoice) -> Option<&[Installment]> {
    match &invoice.payment {
        PaymentCondition::Credit(terms) => match &terms.kind {
            CreditKind::Installments(list) if !list.is_empty() => Some(list),
            _ => None,
        },
        PaymentCondition::Cash => None,
    }
}

/// gCamEsp: a sector block the issuer is flagged for.
pub fn sector(invoice: &Invoice) -> Option<&SectorExtension> {
    invoice
        .sector
        .as_ref()
        .filter(|s| s.is_enabled_by(&invoice.issuer.sectors))
}

/// gTransp: transport data from an issuer flagged for the transport sector.
pub fn transport(invoice: &Invoice) -> Option<&Transport> {
    invoice
        .transport
        .as_ref()
        .filter(|_| invoice.issuer.sectors.transport)
}

/// gCamGen: all eight cargo fields must be present and non-empty.
pub fn general_cargo(invoice: &Invoice) -> Option<&GeneralCargo> {
    invoice.cargo.as_ref().filter(|cargo| {
        [
            &cargo.purchase_order,
            &cargo.sales_order,
            &cargo.accounting_entry,
            &cargo.volume_unit,
            &cargo.total_volume,
            &cargo.weight_unit,
            &cargo.total_weight,
            &cargo.characteristic,
        ]
        .iter()
        .all(|field| field.as_deref().is_some_and(|v| !v.trim().is_empty()))
    })
}

/// gRasMerc: any of serial number, lot number or expiry.
pub fn has_traceability(line: &LineItem) -> bool {
    line.serial_number.is_some() || line.lot_number.is_some() || line.expiry.is_some()
}

/// dCompDir1 / dCompDir2 are only written together.
pub fn address_complements<'a>(
    first: Option<&'a str>,
    second: Option<&'a str>,
) -> Option<(&'a str, &'a str)> {
    match (first, second) {
        (Some(a), Some(b)) if !a.trim().is_empty() && !b.trim().is_empty() => Some((a, b)),
        _ => None,
    }
}
