use rust_decimal::Decimal;

use crate::core::codes;
use crate::core::units::describe_unit;
use crate::core::{GeneralCargo, Totals};
use crate::xml::Element;

use super::format::{described, money, truncate};

/// gTotSub. Advances and rounding are not modelled and always write zero.
pub(super) fn totals_group(totals: &Totals) -> Element {
    let mut group = Element::new("gTotSub");
    let fields = [
        ("dSubExe", totals.exempt),
        ("dSubExo", totals.exonerated),
        ("dSub5", totals.subtotal_5),
        ("dSub10", totals.subtotal_10),
        ("dTotOpe", totals.subtotal),
        ("dTotDesc", totals.discounts),
        ("dTotDescGlotem", totals.global_discounts),
        ("dTotAntItem", Decimal::ZERO),
        ("dTotAnt", Decimal::ZERO),
    ];
    for (name, value) in fields {
        group.push_leaf(name, money(value));
    }
    group.push_leaf("dPorcDescTotal", "0");

    let fields = [
        ("dDescTotal", totals.all_discounts()),
        ("dAnticipo", Decimal::ZERO),
        ("dRedon", Decimal::ZERO),
        ("dTotGralOpe", totals.grand_total),
        ("dIVA5", totals.tax_5),
        ("dIVA10", totals.tax_10),
        ("dTotIVA", totals.tax_total),
        ("dBaseGrav5", totals.base_5),
        ("dBaseGrav10", totals.base_10),
        ("dTBasGraIVA", totals.taxable_base()),
    ];
    for (name, value) in fields {
        group.push_leaf(name, money(value));
    }
    group
}

/// gCamGen. Callers check [`super::predicates::general_cargo`] first.
pub(super) fn cargo_group(cargo: &GeneralCargo) -> Element {
    let text = |value: &Option<String>| value.as_deref().unwrap_or_default().trim().to_string();

    let mut group = Element::new("gCamGen");
    group.push_leaf("dOrdCompra", truncate("dOrdCompra", &text(&cargo.purchase_order), 15));
    group.push_leaf("dOrdVta", truncate("dOrdVta", &text(&cargo.sales_order), 15));
    group.push_leaf("dAsiento", truncate("dAsiento", &text(&cargo.accounting_entry), 10));

    let volume_unit = text(&cargo.volume_unit);
    let weight_unit = text(&cargo.weight_unit);
    let characteristic = text(&cargo.characteristic);

    let mut load = Element::new("gCamCarg");
    load.push_leaf("cUniMedTotVol", volume_unit.as_str());
    load.push_leaf(
        "dDesUniMedTotVol",
        described("dDesUniMedTotVol", &volume_unit, describe_unit(&volume_unit)),
    );
    load.push_leaf("dTotVolMerc", text(&cargo.total_volume));
    load.push_leaf("cUniMedTotPes", weight_unit.as_str());
    load.push_leaf(
        "dDesUniMedTotPes",
        described("dDesUniMedTotPes", &weight_unit, describe_unit(&weight_unit)),
    );
    load.push_leaf("dTotPesMerc", text(&cargo.total_weight));
    load.push_leaf("iCarCarga", characteristic.as_str());
    load.push_leaf(
        "dDesCarCarga",
        described(
            "dDesCarCarga",
            &characteristic,
            codes::describe_cargo_characteristic(&characteristic),
        ),
    );
    group.push(load);
    group
}
