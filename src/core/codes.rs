//! SIFEN code tables.
//!
//! Every `describe_*` function follows the same contract: it returns the
//! human-readable description for a known code and an **empty string** for
//! any code it does not know. The tables may lag behind the tax authority's
//! published lists, so an unknown code is never an error here; the encoder
//! writes the empty description and the schema decides.
//!
//! Tables are sorted by code for binary search.

/// Look up a numeric-keyed table.
fn lookup(table: &'static [(u16, &'static str)], code: u16) -> &'static str {
    table
        .binary_search_by_key(&code, |(c, _)| *c)
        .map(|i| table[i].1)
        .unwrap_or("")
}

/// Look up a numeric-keyed table by a textual code ("01", "12", ...).
fn lookup_text(table: &'static [(u16, &'static str)], code: &str) -> &'static str {
    code.trim()
        .parse::<u16>()
        .map(|c| lookup(table, c))
        .unwrap_or("")
}

/// iTipEmi → dDesTipEmi.
pub fn describe_emission_type(code: u8) -> &'static str {
    lookup(EMISSION_TYPES, code.into())
}

/// iTiDE → dDesTiDE.
pub fn describe_document_type(code: u8) -> &'static str {
    lookup(DOCUMENT_TYPES, code.into())
}

/// iTipTra → dDesTipTra.
pub fn describe_transaction_type(code: u8) -> &'static str {
    lookup(TRANSACTION_TYPES, code.into())
}

/// iTImp → dDesTImp.
pub fn describe_tax_affected(code: u8) -> &'static str {
    lookup(TAX_AFFECTED, code.into())
}

/// iCondAnt → dDesCondAnt.
pub fn describe_advance_condition(code: u8) -> &'static str {
    lookup(ADVANCE_CONDITIONS, code.into())
}

/// iIndPres → dDesIndPres.
pub fn describe_presence(code: u8) -> &'static str {
    lookup(PRESENCE_INDICATORS, code.into())
}

/// iCondOpe → dDCondOpe.
pub fn describe_sale_condition(code: u8) -> &'static str {
    lookup(SALE_CONDITIONS, code.into())
}

/// iCondCred → dDCondCred.
pub fn describe_credit_condition(code: u8) -> &'static str {
    lookup(CREDIT_CONDITIONS, code.into())
}

/// iAfecIVA → dDesAfecIVA.
pub fn describe_tax_treatment(code: u8) -> &'static str {
    lookup(TAX_TREATMENTS, code.into())
}

/// iTipIDRec → dDTipIDRec (recipients without RUC).
pub fn describe_recipient_document(code: u8) -> &'static str {
    lookup(RECIPIENT_DOCUMENTS, code.into())
}

/// iTipIDRespDE / iTipIDTrans → description.
pub fn describe_identity_document(code: u8) -> &'static str {
    lookup(IDENTITY_DOCUMENTS, code.into())
}

/// iTipTrans → dDesTipTrans.
pub fn describe_transport_kind(code: u8) -> &'static str {
    lookup(TRANSPORT_KINDS, code.into())
}

/// iModTrans → dDesModTrans.
pub fn describe_transport_mode(code: u8) -> &'static str {
    lookup(TRANSPORT_MODES, code.into())
}

/// iCarCarga → dDesCarCarga.
pub fn describe_cargo_characteristic(code: &str) -> &'static str {
    lookup_text(CARGO_CHARACTERISTICS, code)
}

/// cDep* → dDesDep*.
pub fn describe_department(code: &str) -> &'static str {
    lookup_text(DEPARTMENTS, code)
}

/// cDis* → dDesDis*.
pub fn describe_district(code: &str) -> &'static str {
    lookup_text(DISTRICTS, code)
}

/// cCiu* → dDesCiu*.
pub fn describe_city(code: &str) -> &'static str {
    lookup_text(CITIES, code)
}

/// cActEco → dDesActEco.
pub fn describe_activity(code: &str) -> &'static str {
    ACTIVITIES
        .binary_search_by_key(&code.trim(), |(c, _)| *c)
        .map(|i| ACTIVITIES[i].1)
        .unwrap_or("")
}

/// Whether a closed-set code is known for the given table kind.
pub fn is_known_transaction_type(code: u8) -> bool {
    !describe_transaction_type(code).is_empty()
}

pub fn is_known_presence(code: u8) -> bool {
    !describe_presence(code).is_empty()
}

pub fn is_known_tax_treatment(code: u8) -> bool {
    !describe_tax_treatment(code).is_empty()
}

static EMISSION_TYPES: &[(u16, &str)] = &[(1, "Normal"), (2, "Contingencia")];

static DOCUMENT_TYPES: &[(u16, &str)] = &[
    (1, "Factura electrónica"),
    (4, "Autofactura electrónica"),
    (5, "Nota de crédito electrónica"),
    (6, "Nota de débito electrónica"),
    (7, "Nota de remisión electrónica"),
];

static TRANSACTION_TYPES: &[(u16, &str)] = &[
    (1, "Venta de mercadería"),
    (2, "Prestación de servicios"),
    (3, "Mixto (Venta de mercadería y servicios)"),
    (4, "Venta de activo fijo"),
    (5, "Venta de divisas"),
    (6, "Compra de divisas"),
    (7, "Promoción o entrega de muestras"),
    (8, "Donación"),
    (9, "Anticipo"),
    (10, "Compra de productos"),
    (11, "Compra de servicios"),
    (12, "Venta de crédito fiscal"),
    (13, "Muestras médicas"),
];

static TAX_AFFECTED: &[(u16, &str)] = &[
    (1, "IVA"),
    (2, "ISC"),
    (3, "Renta"),
    (4, "Ninguno"),
    (5, "IVA - Renta"),
];

static ADVANCE_CONDITIONS: &[(u16, &str)] = &[(1, "Anticipo Global"), (2, "Anticipo por Ítem")];

static PRESENCE_INDICATORS: &[(u16, &str)] = &[
    (1, "Operación presencial"),
    (2, "Operación electrónica"),
    (3, "Operación telemarketing"),
    (4, "Venta a domicilio"),
    (5, "Operación bancaria"),
    (6, "Operación cíclica"),
    (9, "Otro"),
];

static SALE_CONDITIONS: &[(u16, &str)] = &[(1, "Contado"), (2, "Crédito")];

static CREDIT_CONDITIONS: &[(u16, &str)] = &[(1, "Plazo"), (2, "Cuota")];

static TAX_TREATMENTS: &[(u16, &str)] = &[
    (1, "Gravado IVA"),
    (2, "Exonerado (Art. 100 - Ley 6380/2019)"),
    (3, "Exento"),
    (4, "Gravado parcial (Grav-Exento)"),
];

static RECIPIENT_DOCUMENTS: &[(u16, &str)] = &[
    (1, "Cédula paraguaya"),
    (2, "Pasaporte"),
    (3, "Cédula extranjera"),
    (4, "Carnet de residencia"),
    (5, "Innominado"),
    (6, "Tarjeta Diplomática de exoneración fiscal"),
    (9, "Otro"),
];

static IDENTITY_DOCUMENTS: &[(u16, &str)] = &[
    (1, "Cédula paraguaya"),
    (2, "Pasaporte"),
    (3, "Cédula extranjera"),
    (4, "Carnet de residencia"),
    (9, "Otro"),
];

static TRANSPORT_KINDS: &[(u16, &str)] = &[(1, "Propio"), (2, "Tercero")];

static TRANSPORT_MODES: &[(u16, &str)] = &[
    (1, "Terrestre"),
    (2, "Fluvial"),
    (3, "Aéreo"),
    (4, "Multimodal"),
];

static CARGO_CHARACTERISTICS: &[(u16, &str)] = &[
    (1, "Mercaderías con cadena de frío"),
    (2, "Carga peligrosa"),
    (3, "Otro"),
];

static DEPARTMENTS: &[(u16, &str)] = &[
    (1, "CAPITAL"),
    (2, "CONCEPCION"),
    (3, "SAN PEDRO"),
    (4, "CORDILLERA"),
    (5, "GUAIRA"),
    (6, "CAAGUAZU"),
    (7, "CAAZAPA"),
    (8, "ITAPUA"),
    (9, "MISIONES"),
    (10, "PARAGUARI"),
    (11, "ALTO PARANA"),
    (12, "CENTRAL"),
    (13, "NEEMBUCU"),
    (14, "AMAMBAY"),
    (15, "CANINDEYU"),
    (16, "PRESIDENTE HAYES"),
    (17, "BOQUERON"),
    (18, "ALTO PARAGUAY"),
];

// Partial extract of the district and city tables.
static DISTRICTS: &[(u16, &str)] = &[
    (1, "ASUNCION (DISTRITO)"),
    (2, "CONCEPCION (MUNICIPIO)"),
    (7, "SAN LORENZO"),
    (143, "CIUDAD DEL ESTE"),
    (169, "ENCARNACION"),
];

static CITIES: &[(u16, &str)] = &[
    (1, "ASUNCION (DISTRITO)"),
    (3, "CONCEPCION (MUNICIPIO)"),
    (1046, "SAN LORENZO"),
    (3428, "CIUDAD DEL ESTE"),
    (6106, "ENCARNACION"),
];

static ACTIVITIES: &[(&str, &str)] = &[
    ("46900", "Venta al por mayor no especializada"),
    ("47190", "Otras actividades de venta al por menor en comercios no especializados"),
    ("49231", "Transporte de carga por carretera"),
    ("62010", "Actividades de programación informática"),
    ("69201", "Actividades de contabilidad, teneduría de libros y auditoría"),
];
