use crate::core::codes;
use crate::core::units::describe_unit;
use crate::core::{
    Carrier, CarrierIdentity, CreditKind, EnergyData, InsuranceData, Invoice, LineItem,
    PaymentCondition, SectorExtension, SifenError, SupermarketData, Transport, TransportPoint,
    Vehicle, describe_country, describe_currency,
};
use crate::xml::Element;

use super::format::{
    credit_term, date, datetime, described, digits_only, fixed, money, trimmed4, truncate,
};
use super::predicates;

/// gDtipDE: presence, sale condition, items and the optional sector and transport blocks.
pub(super) fn document_type_group(invoice: &Invoice) -> Result<Element, SifenError> {
    let mut group = Element::new("gDtipDE");

    let mut invoice_fields = Element::new("gCamFE");
    invoice_fields.push_leaf("iIndPres", invoice.presence.to_string());
    invoice_fields.push_leaf("dDesIndPres", codes::describe_presence(invoice.presence));
    group.push(invoice_fields);

    group.push(condition_group(invoice)?);
    for line in &invoice.lines {
        group.push(item_group(line)?);
    }
    if let Some(sector) = predicates::sector(invoice) {
        group.push(sector_group(sector)?);
    }
    if let Some(transport) = predicates::transport(invoice) {
        group.push(transport_group(transport)?);
    }
    Ok(group)
}

/// gCamCond, with gPagCred for credit sales.
fn condition_group(invoice: &Invoice) -> Result<Element, SifenError> {
    let code = invoice.payment.code();
    let mut group = Element::new("gCamCond");
    group.push_leaf("iCondOpe", code.to_string());
    group.push_leaf("dDCondOpe", codes::describe_sale_condition(code));

    let PaymentCondition::Credit(terms) = &invoice.payment else {
        return Ok(group);
    };

    let mut credit = Element::new("gPagCred");
    credit.push_leaf("iCondCred", terms.kind.code().to_string());
    credit.push_leaf(
        "dDCondCred",
        codes::describe_credit_condition(terms.kind.code()),
    );
    match &terms.kind {
        CreditKind::Term(term) => credit.push_leaf("dPlazoCre", credit_term(term)),
        CreditKind::Installments(list) => credit.push_leaf("dCuotas", list.len().to_string()),
    }
    if let Some(down_payment) = terms.down_payment {
        credit.push_leaf("dMonEnt", trimmed4(down_payment));
    }

    if let Some(installments) = predicates::installments(invoice) {
        for installment in installments {
            let mut entry = Element::new("gCuotas");
            entry.push_leaf("cMoneCuo", installment.currency.as_str());
            entry.push_leaf(
                "dDMoneCuo",
                described(
                    "dDMoneCuo",
                    &installment.currency,
                    describe_currency(&installment.currency),
                ),
            );
            entry.push_leaf("dMonCuota", trimmed4(installment.amount));
            if let Some(due) = &installment.due_date {
                entry.push_leaf("dVencCuo", date(due)?);
            }
            credit.push(entry);
        }
    }
    group.push(credit);
    Ok(group)
}

/// gCamItem.
fn item_group(line: &LineItem) -> Result<Element, SifenError> {
    let mut item = Element::new("gCamItem");
    item.push_leaf("dCodInt", line.code.as_str());

    if let Some(heading) = &line.tariff_heading {
        let digits = digits_only(heading);
        if digits.len() >= 4 {
            item.push_leaf("dParAranc", &digits[..4]);
        } else {
            tracing::warn!(code = %line.code, heading = %heading, "tariff heading needs 4 digits, skipped");
        }
    }
    if let Some(ncm) = &line.ncm {
        let digits = digits_only(ncm);
        if (6..=8).contains(&digits.len()) {
            item.push_leaf("dNCM", digits);
        } else {
            tracing::warn!(code = %line.code, ncm = %ncm, "NCM needs 6 to 8 digits, skipped");
        }
    }
    if let Some(gtin) = &line.gtin {
        item.push_leaf("dGtin", gtin.as_str());
    }
    if let Some(gtin) = &line.gtin_package {
        item.push_leaf("dGtinPq", gtin.as_str());
    }

    item.push_leaf("dDesProSer", truncate("dDesProSer", &line.description, 120));
    item.push_leaf("cUniMed", line.unit.as_str());
    item.push_leaf(
        "dDesUniMed",
        described("dDesUniMed", &line.unit, describe_unit(&line.unit)),
    );
    item.push_leaf("dCantProSer", trimmed4(line.quantity));
    if let Some(country) = &line.origin_country {
        item.push_leaf("cPaisOrig", country.as_str());
        item.push_leaf(
            "dDesPaisOrig",
            described("dDesPaisOrig", country, describe_country(country)),
        );
    }
    if let Some(info) = &line.extra_info {
        item.push_leaf("dInfItem", truncate("dInfItem", info, 500));
    }

    let mut value = Element::new("gValorItem");
    value.push_leaf("dPUniProSer", trimmed4(line.unit_price));
    value.push_leaf("dTotBruOpeItem", money(line.subtotal()));
    let mut deductions = Element::new("gValorRestaItem");
    deductions.push_leaf("dDescItem", money(line.discount.unwrap_or_default()));
    deductions.push_leaf(
        "dPorcDesIt",
        trimmed4(line.discount_percent.unwrap_or_default()),
    );
    deductions.push_leaf(
        "dDescGloItem",
        money(line.global_discount.unwrap_or_default()),
    );
    deductions.push_leaf("dTotOpeItem", money(line.net_amount()));
    value.push(deductions);
    item.push(value);

    let mut tax = Element::new("gCamIVA");
    tax.push_leaf("iAfecIVA", line.tax_treatment.to_string());
    tax.push_leaf(
        "dDesAfecIVA",
        codes::describe_tax_treatment(line.tax_treatment),
    );
    tax.push_leaf("dPropIVA", trimmed4(line.tax_proportion));
    tax.push_leaf("dTasaIVA", trimmed4(line.tax_rate));
    tax.push_leaf("dBasGravIVA", money(line.taxable_base()));
    tax.push_leaf("dLiqIVAItem", money(line.tax_amount()));
    item.push(tax);

    if predicates::has_traceability(line) {
        let mut trace = Element::new("gRasMerc");
        if let Some(serial) = &line.serial_number {
            trace.push_leaf("dNSerie", truncate("dNSerie", serial, 10));
        }
        if let Some(lot) = &line.lot_number {
            trace.push_leaf("dNumLote", truncate("dNumLote", lot, 80));
        }
        if let Some(expiry) = &line.expiry {
            trace.push_leaf("dVencMerc", date(expiry)?);
        }
        item.push(trace);
    }
    Ok(item)
}

/// gCamEsp.
fn sector_group(sector: &SectorExtension) -> Result<Element, SifenError> {
    let mut group = Element::new("gCamEsp");
    match sector {
        SectorExtension::Energy(data) => group.push(energy_group(data)),
        SectorExtension::Insurance(data) => group.push(insurance_group(data)?),
        SectorExtension::Supermarket(data) => group.push(supermarket_group(data)),
    }
    Ok(group)
}

fn energy_group(data: &EnergyData) -> Element {
    let mut group = Element::new("gGrupEner");
    if let Some(meter) = &data.meter_number {
        group.push_leaf("dNroMed", truncate("dNroMed", meter, 50));
    }
    if let Some(activity) = &data.activity_code {
        group.push_leaf("dActiv", activity.as_str());
    }
    if let Some(category) = &data.category {
        group.push_leaf("dCateg", truncate("dCateg", category, 3));
    }
    let readings = [
        ("dLecAnt", data.previous_reading),
        ("dLecAct", data.current_reading),
        ("dConKwh", data.consumption_kwh),
    ];
    for (name, reading) in readings {
        if let Some(reading) = reading {
            group.push_leaf(name, trimmed4(reading));
        }
    }
    group
}

fn insurance_group(data: &InsuranceData) -> Result<Element, SifenError> {
    let mut group = Element::new("gGrupSeg");
    group.push_leaf("dCodEmpSeg", truncate("dCodEmpSeg", &data.company_code, 20));
    for policy in &data.policies {
        let mut entry = Element::new("gGrupPolSeg");
        entry.push_leaf("dPoliza", truncate("dPoliza", &policy.number, 25));
        entry.push_leaf("dUnidVig", truncate("dUnidVig", &policy.validity_unit, 15));
        entry.push_leaf("dVigencia", truncate("dVigencia", &policy.validity, 10));
        if let Some(full) = &policy.full_number {
            entry.push_leaf("dNumPoliza", truncate("dNumPoliza", full, 25));
        }
        if let Some(starts) = &policy.starts {
            entry.push_leaf("dFecIniVig", datetime(starts)?);
        }
        if let Some(ends) = &policy.ends {
            entry.push_leaf("dFecFinVig", datetime(ends)?);
        }
        if let Some(code) = &policy.internal_code {
            entry.push_leaf("dCodInt", truncate("dCodInt", code, 20));
        }
        group.push(entry);
    }
    Ok(group)
}

fn supermarket_group(data: &SupermarketData) -> Element {
    let mut group = Element::new("gGrupSup");
    if let Some(cashier) = &data.cashier {
        group.push_leaf("dNomCaj", truncate("dNomCaj", cashier, 20));
    }
    if let Some(cash) = data.cash {
        group.push_leaf("dEfectivo", fixed(cash, 4));
    }
    if let Some(change) = data.change {
        group.push_leaf("dVuelto", fixed(change, 6));
    }
    if let Some(donation) = data.donation {
        group.push_leaf("dDonac", fixed(donation, 6));
    }
    if let Some(description) = &data.donation_description {
        group.push_leaf("dDesDonac", truncate("dDesDonac", description, 20));
    }
    group
}

/// gTransp.
fn transport_group(transport: &Transport) -> Result<Element, SifenError> {
    let mut group = Element::new("gTransp");
    group.push_leaf("iTipTrans", transport.kind.to_string());
    group.push_leaf(
        "dDesTipTrans",
        codes::describe_transport_kind(transport.kind),
    );
    group.push_leaf("iModTrans", transport.mode.to_string());
    group.push_leaf(
        "dDesModTrans",
        codes::describe_transport_mode(transport.mode),
    );
    group.push_leaf("iRespFlete", transport.freight_payer.to_string());
    if let Some(incoterm) = &transport.incoterm {
        group.push_leaf("cCondNeg", incoterm.as_str());
    }
    if let Some(manifest) = &transport.manifest {
        group.push_leaf("dNuManif", truncate("dNuManif", manifest, 15));
    }
    if let Some(dispatch) = &transport.import_dispatch {
        group.push_leaf("dNuDespImp", truncate("dNuDespImp", dispatch, 16));
    }
    if let Some(starts) = &transport.starts {
        group.push_leaf("dIniTras", date(starts)?);
    }
    if let Some(ends) = &transport.ends {
        group.push_leaf("dFinTras", date(ends)?);
    }
    if let Some(country) = &transport.destination_country {
        group.push_leaf("cPaisDest", country.as_str());
        group.push_leaf(
            "dDesPaisDest",
            described("dDesPaisDest", country, describe_country(country)),
        );
    }
    if let Some(point) = &transport.departure {
        group.push(point_group(point, PointTags::DEPARTURE));
    }
    if let Some(point) = &transport.delivery {
        group.push(point_group(point, PointTags::DELIVERY));
    }
    for vehicle in &transport.vehicles {
        group.push(vehicle_group(vehicle));
    }
    if let Some(carrier) = &transport.carrier {
        group.push(carrier_group(carrier));
    }
    Ok(group)
}

struct PointTags {
    group: &'static str,
    address: &'static str,
    house: &'static str,
    department: (&'static str, &'static str),
    district: (&'static str, &'static str),
    city: (&'static str, &'static str),
    phone: &'static str,
}

impl PointTags {
    const DEPARTURE: Self = Self {
        group: "gCamSal",
        address: "dDirLocSal",
        house: "dNumCasSal",
        department: ("cDepSal", "dDesDepSal"),
        district: ("cDisSal", "dDesDisSal"),
        city: ("cCiuSal", "dDesCiuSal"),
        phone: "dTelSal",
    };

    const DELIVERY: Self = Self {
        group: "gCamEnt",
        address: "dDirLocEnt",
        house: "dNumCasEnt",
        department: ("cDepEnt", "dDesDepEnt"),
        district: ("cDisEnt", "dDesDisEnt"),
        city: ("cCiuEnt", "dDesCiuEnt"),
        phone: "dTelEnt",
    };
}

fn point_group(point: &TransportPoint, tags: PointTags) -> Element {
    let mut group = Element::new(tags.group);
    group.push_leaf(tags.address, truncate(tags.address, &point.address, 150));
    group.push_leaf(tags.house, truncate(tags.house, point.house_number.trim(), 10));
    let (code, desc) = tags.department;
    group.push_leaf(code, point.department.as_str());
    group.push_leaf(
        desc,
        described(
            desc,
            &point.department,
            codes::describe_department(&point.department),
        ),
    );
    if let Some(district) = &point.district {
        let (code, desc) = tags.district;
        group.push_leaf(code, district.as_str());
        group.push_leaf(
            desc,
            described(desc, district, codes::describe_district(district)),
        );
    }
    let (code, desc) = tags.city;
    group.push_leaf(code, point.city.as_str());
    group.push_leaf(
        desc,
        described(desc, &point.city, codes::describe_city(&point.city)),
    );
    if let Some(phone) = &point.phone {
        group.push_leaf(tags.phone, truncate(tags.phone, phone, 20));
    }
    group
}

fn vehicle_group(vehicle: &Vehicle) -> Element {
    let mut group = Element::new("gVehTras");
    group.push_leaf("dTiVehTras", truncate("dTiVehTras", &vehicle.kind, 10));
    group.push_leaf("dMarVeh", truncate("dMarVeh", &vehicle.brand, 10));
    group.push_leaf("dTipIdenVeh", vehicle.id_type.to_string());
    if let Some(id) = &vehicle.id_number {
        group.push_leaf("dNroIDVeh", truncate("dNroIDVeh", id, 20));
    }
    if let Some(plate) = &vehicle.plate {
        group.push_leaf("dNroMatVeh", truncate("dNroMatVeh", plate, 6));
    }
    if let Some(flight) = &vehicle.flight {
        group.push_leaf("dNroVuelo", truncate("dNroVuelo", flight, 6));
    }
    group
}

fn carrier_group(carrier: &Carrier) -> Element {
    let mut group = Element::new("gCamTrans");
    group.push_leaf("iNatTrans", carrier.identity.nature_code().to_string());
    group.push_leaf("dNomTrans", truncate("dNomTrans", &carrier.name, 120));
    match &carrier.identity {
        CarrierIdentity::Taxpayer { ruc, check_digit } => {
            group.push_leaf("dRucTrans", ruc.trim());
            group.push_leaf("dDVTrans", check_digit.as_str());
        }
        CarrierIdentity::NonTaxpayer {
            document_type,
            document_number,
            nationality,
        } => {
            group.push_leaf("iTipIDTrans", document_type.to_string());
            group.push_leaf(
                "dDTipIDTrans",
                codes::describe_identity_document(*document_type),
            );
            group.push_leaf(
                "dNumIDTrans",
                truncate("dNumIDTrans", document_number.trim(), 20),
            );
            if let Some(country) = nationality {
                group.push_leaf("cNacTrans", country.as_str());
                group.push_leaf(
                    "dDesNacTrans",
                    described("dDesNacTrans", country, describe_country(country)),
                );
            }
        }
    }
    group.push_leaf("dNumIDChof", truncate("dNumIDChof", &carrier.driver_id, 20));
    group.push_leaf("dNomChof", truncate("dNomChof", &carrier.driver_name, 120));
    if let Some(address) = &carrier.fiscal_address {
        group.push_leaf("dDomFisc", truncate("dDomFisc", address, 150));
    }
    group
}
