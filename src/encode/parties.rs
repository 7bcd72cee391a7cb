use crate::core::codes;
use crate::core::{Address, Issuer, Recipient, RecipientIdentity, describe_country};
use crate::xml::Element;

use super::format::{described, truncate};
use super::predicates::address_complements;

/// gEmis.
pub(super) fn issuer_group(issuer: &Issuer) -> Element {
    let mut group = Element::new("gEmis");
    group.push_leaf("dRucEm", issuer.ruc.trim());
    group.push_leaf("dDVEmi", issuer.check_digit.as_str());
    group.push_leaf("iTipCont", issuer.taxpayer_type.code().to_string());
    if let Some(regime) = issuer.regime {
        group.push_leaf("cTipReg", regime.to_string());
    }
    group.push_leaf("dNomEmi", truncate("dNomEmi", &issuer.name, 255));
    if let Some(trade_name) = &issuer.trade_name {
        group.push_leaf("dNomFanEmi", truncate("dNomFanEmi", trade_name, 255));
    }
    push_address(&mut group, &issuer.address, AddressTags::ISSUER);
    group.push_leaf("dTelEmi", truncate("dTelEmi", &issuer.phone, 15));
    group.push_leaf(
        "dEmailE",
        truncate("dEmailE", &issuer.email.trim().to_lowercase(), 80),
    );
    if let Some(branch) = &issuer.branch {
        group.push_leaf("dDenSuc", truncate("dDenSuc", branch, 30));
    }

    for code in &issuer.activities {
        let mut activity = Element::new("gActEco");
        activity.push_leaf("cActEco", code.as_str());
        activity.push_leaf(
            "dDesActEco",
            described("dDesActEco", code, codes::describe_activity(code)),
        );
        group.push(activity);
    }

    if let Some(responsible) = &issuer.responsible {
        let mut resp = Element::new("gRespDE");
        resp.push_leaf("iTipIDRespDE", responsible.document_type.to_string());
        resp.push_leaf(
            "dDTipIDRespDE",
            codes::describe_identity_document(responsible.document_type),
        );
        resp.push_leaf(
            "dNumIDRespDE",
            truncate("dNumIDRespDE", &responsible.document_number, 20),
        );
        resp.push_leaf("dNomRespDE", truncate("dNomRespDE", &responsible.name, 255));
        resp.push_leaf(
            "dCarRespDE",
            truncate("dCarRespDE", &responsible.position, 100),
        );
        group.push(resp);
    }
    group
}

/// gDatRec.
pub(super) fn recipient_group(recipient: &Recipient) -> Element {
    let mut group = Element::new("gDatRec");
    group.push_leaf("iNatRec", recipient.identity.nature_code().to_string());
    group.push_leaf("iTiOpe", recipient.operation_type.to_string());
    group.push_leaf("cPaisRec", recipient.country.as_str());
    group.push_leaf(
        "dDesPaisRe",
        described(
            "dDesPaisRe",
            &recipient.country,
            describe_country(&recipient.country),
        ),
    );

    match &recipient.identity {
        RecipientIdentity::Taxpayer {
            taxpayer_type,
            ruc,
            check_digit,
        } => {
            group.push_leaf("iTiContRec", taxpayer_type.code().to_string());
            group.push_leaf("dRucRec", ruc.trim());
            group.push_leaf("dDVRec", check_digit.as_str());
        }
        RecipientIdentity::NonTaxpayer {
            document_type,
            document_number,
        } => {
            group.push_leaf("iTipIDRec", document_type.to_string());
            group.push_leaf(
                "dDTipIDRec",
                codes::describe_recipient_document(*document_type),
            );
            group.push_leaf(
                "dNumIDRec",
                truncate("dNumIDRec", document_number.trim(), 20),
            );
        }
    }

    group.push_leaf("dNomRec", truncate("dNomRec", &recipient.name, 255));
    if let Some(trade_name) = &recipient.trade_name {
        group.push_leaf("dNomFanRec", truncate("dNomFanRec", trade_name, 255));
    }
    if let Some(address) = &recipient.address {
        push_address(&mut group, address, AddressTags::RECIPIENT);
    }
    if let Some(phone) = &recipient.phone {
        group.push_leaf("dTelRec", truncate("dTelRec", phone, 15));
    }
    if let Some(mobile) = &recipient.mobile {
        group.push_leaf("dCelRec", truncate("dCelRec", mobile, 20));
    }
    if let Some(email) = &recipient.email {
        group.push_leaf(
            "dEmailRec",
            truncate("dEmailRec", &email.trim().to_lowercase(), 80),
        );
    }
    if let Some(code) = &recipient.customer_code {
        group.push_leaf("dCodCliente", truncate("dCodCliente", code, 15));
    }
    group
}

/// Element names of one address block.
struct AddressTags {
    street: &'static str,
    house: &'static str,
    complements: Option<(&'static str, &'static str)>,
    department: (&'static str, &'static str),
    district: (&'static str, &'static str),
    city: (&'static str, &'static str),
}

impl AddressTags {
    const ISSUER: Self = Self {
        street: "dDirEmi",
        house: "dNumCas",
        complements: Some(("dCompDir1", "dCompDir2")),
        department: ("cDepEmi", "dDesDepEmi"),
        district: ("cDisEmi", "dDesDisEmi"),
        city: ("cCiuEmi", "dDesCiuEmi"),
    };

    const RECIPIENT: Self = Self {
        street: "dDirRec",
        house: "dNumCasRec",
        complements: None,
        department: ("cDepRec", "dDesDepRec"),
        district: ("cDisRec", "dDesDisRec"),
        city: ("cCiuRec", "dDesCiuRec"),
    };
}

fn push_address(group: &mut Element, address: &Address, tags: AddressTags) {
    group.push_leaf(tags.street, truncate(tags.street, &address.street, 255));
    group.push_leaf(tags.house, truncate(tags.house, address.house_number.trim(), 6));
    if let Some((first_tag, second_tag)) = tags.complements {
        if let Some((first, second)) = address_complements(
            address.complement1.as_deref(),
            address.complement2.as_deref(),
        ) {
            group.push_leaf(first_tag, truncate(first_tag, first, 255));
            group.push_leaf(second_tag, truncate(second_tag, second, 255));
        }
    }

    let (code_tag, desc_tag) = tags.department;
    group.push_leaf(code_tag, address.department.as_str());
    group.push_leaf(
        desc_tag,
        described(
            desc_tag,
            &address.department,
            codes::describe_department(&address.department),
        ),
    );
    if let Some(district) = &address.district {
        let (code_tag, desc_tag) = tags.district;
        group.push_leaf(code_tag, district.as_str());
        group.push_leaf(
            desc_tag,
            described(desc_tag, district, codes::describe_district(district)),
        );
    }
    let (code_tag, desc_tag) = tags.city;
    group.push_leaf(code_tag, address.city.as_str());
    group.push_leaf(
        desc_tag,
        described(desc_tag, &address.city, codes::describe_city(&address.city)),
    );
}
