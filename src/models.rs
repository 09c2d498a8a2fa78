use std::fmt;

/// One SAP line item as read from the export.
#[derive(Debug, Clone, PartialEq)]
pub struct SapRecord {
    /// 1-based row number in the source sheet, for diagnostics.
    pub row: usize,
    pub order: String,
    pub operation: i64,
    pub cost_element: String,
    pub cost_element_name: String,
    pub partner_cctr: Option<u64>,
    pub quantity: f64,
    pub amount: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CostType {
    Labor,
    Contracts,
    Afudc,
    LaborAlloc,
    Other,
}

impl CostType {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Labor => "Labor",
            Self::Contracts => "Contracts",
            Self::Afudc => "AFUDC",
            Self::LaborAlloc => "Labor Alloc.",
            Self::Other => "Other",
        }
    }

    /// Prefix applied to Resource File descriptions.
    pub fn resource_prefix(&self) -> &'static str {
        match self {
            Self::Labor => "Actls. - Labr. - ",
            Self::Contracts => "Actls. - Cont. - ",
            Self::Afudc => "Actls. - AFUDC - ",
            Self::LaborAlloc => "Actls. - L.OH. - ",
            Self::Other => "Actls. - Other. - ",
        }
    }
}

impl fmt::Display for CostType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A row of the "Actuals Report" sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct ActualsRow {
    pub bid_item: u32,
    pub activity: String,
    pub resource: String,
    pub quantity: f64,
    pub units: String,
    pub unit_price: f64,
    pub tax_ot_percent: f64,
    pub pieces: u32,
    /// Cost element code; blank for overhead rows.
    pub supp_desc: Option<String>,
    pub description: String,
    pub cost_type: CostType,
}

/// A row of the "Actual BoE" sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct BoeNoteRow {
    pub bid_item: u32,
    pub activity: String,
    pub date: String,
    pub notes: String,
}

/// A row of the "Resource File" sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceRow {
    pub code: String,
    pub description: String,
    pub unit: String,
}
