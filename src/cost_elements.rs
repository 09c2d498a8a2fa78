use crate::models::CostType;

/// Cost element text SAP uses for labor allocation postings.
pub const LABOR_ALLOC_ELEMENT: &str = "Labor Alloc.";

pub const AFUDC_BORROWED: u32 = 5590030;
pub const AFUDC_EQUITY: u32 = 5590031;

/// HeavyBid local resources are prefixed with `6`.
pub const RESOURCE_PREFIX: char = '6';
pub const LABOR_OH_RESOURCE: &str = "6Labor OH";

const ABBREVIATIONS: &[(u32, &str)] = &[
    // AFUDC
    (5590030, "AFUDC-Bo"),
    (5590031, "AFUDC-Eq"),
    // Contracts / overhead
    (5091100, "Meals Ex"),
    (5091140, "Reimburs"),
    (5490000, "Contract"),
    (5490003, "Engr/Dsg"),
    (5490015, "Environm"),
    // Labor (660xxxx)
    (6603001, "CONSTR"),
    (6603004, "ACQLIT"),
    (6603005, "ANLYST"),
    (6603006, "DRFT"),
    (6603023, "ENGSVC"),
    (6603024, "ENVSVC"),
    (6603027, "ENVPLN"),
    (6603048, "PLANSV"),
    (6603058, "TECHSV"),
    (6603059, "LNDENG"),
    (6603082, "MO-OT"),
    (6603083, "MO"),
    (6603150, "ADM-OT"),
    (6603195, "CORRSN"),
    (6603227, "LNDRTS"),
    (6603823, "BIOCUL"),
    (6608158, "XCON02"),
    (6608160, "XCON04"),
];

const EXPLICIT_TYPES: &[(u32, CostType)] = &[
    (5590030, CostType::Afudc),
    (5590031, CostType::Afudc),
    (5091100, CostType::Contracts),
    (5091140, CostType::Contracts),
    (5490000, CostType::Contracts),
    (5490003, CostType::Contracts),
    (5490015, CostType::Contracts),
];

/// Normalize a raw cost element cell to its integer code. Spreadsheet
/// readers hand numeric codes over as floats (`5490000.0`).
pub fn element_code(raw: &str) -> Option<u32> {
    let s = raw.trim();
    if let Ok(n) = s.parse::<u32>() {
        return Some(n);
    }
    let f: f64 = s.parse().ok()?;
    if f.fract() == 0.0 && f >= 0.0 && f <= u32::MAX as f64 {
        Some(f as u32)
    } else {
        None
    }
}

pub fn cost_type(raw: &str) -> CostType {
    if raw.trim() == LABOR_ALLOC_ELEMENT {
        return CostType::LaborAlloc;
    }
    let Some(code) = element_code(raw) else {
        return CostType::Other;
    };
    if let Some((_, t)) = EXPLICIT_TYPES.iter().find(|(c, _)| *c == code) {
        return *t;
    }
    let digits = code.to_string();
    if digits.starts_with("660") {
        CostType::Labor
    } else if digits.starts_with("50") {
        CostType::Contracts
    } else {
        CostType::Other
    }
}

/// Labor overhead elements (6010xxx) are rolled into one `6Labor OH` line
/// per activity instead of forming their own buckets.
pub fn is_overhead(raw: &str) -> bool {
    element_code(raw).is_some_and(|c| c.to_string().starts_with("6010"))
}

pub fn abbreviation(raw: &str, name: &str) -> String {
    if raw.trim() == LABOR_ALLOC_ELEMENT {
        return "Labor OH".to_string();
    }
    if let Some(code) = element_code(raw) {
        if let Some((_, abbrev)) = ABBREVIATIONS.iter().find(|(c, _)| *c == code) {
            return abbrev.to_string();
        }
    }
    let upper = name.trim().to_uppercase();
    let words: Vec<&str> = upper.split_whitespace().collect();
    if words.len() >= 2 {
        words[..2]
            .iter()
            .map(|w| w.chars().take(3).collect::<String>())
            .collect()
    } else {
        upper.chars().take(6).collect()
    }
}

/// Resource identifier: `6` + abbreviation, plus the partner cost center
/// for crews charged from another center.
pub fn resource_code(raw: &str, partner_cctr: Option<u64>, name: &str) -> String {
    let abbrev = abbreviation(raw, name);
    match partner_cctr {
        Some(p) if p > 0 => format!("{RESOURCE_PREFIX}{abbrev}{p}"),
        _ => format!("{RESOURCE_PREFIX}{abbrev}"),
    }
}

/// Resource code as shown to people (BoE notes, labor descriptions).
pub fn display_resource(code: &str) -> &str {
    code.strip_prefix(RESOURCE_PREFIX).unwrap_or(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_code_normalizes_floats() {
        assert_eq!(element_code("5490000"), Some(5490000));
        assert_eq!(element_code("5490000.0"), Some(5490000));
        assert_eq!(element_code(" 6603023 "), Some(6603023));
        assert_eq!(element_code("Labor Alloc."), None);
        assert_eq!(element_code("12.5"), None);
        assert_eq!(element_code(""), None);
    }

    #[test]
    fn test_cost_type_classification() {
        assert_eq!(cost_type("5590030"), CostType::Afudc);
        assert_eq!(cost_type("5490003"), CostType::Contracts);
        assert_eq!(cost_type("6603023"), CostType::Labor);
        assert_eq!(cost_type("6609999"), CostType::Labor);
        assert_eq!(cost_type("5012345"), CostType::Contracts);
        assert_eq!(cost_type("Labor Alloc."), CostType::LaborAlloc);
        assert_eq!(cost_type("7100000"), CostType::Other);
        assert_eq!(cost_type("misc"), CostType::Other);
    }

    #[test]
    fn test_overhead_elements() {
        assert!(is_overhead("6010001"));
        assert!(is_overhead("6010250.0"));
        assert!(!is_overhead("6603023"));
        assert!(!is_overhead("Labor Alloc."));
    }

    #[test]
    fn test_resource_code_with_partner_center() {
        assert_eq!(resource_code("6603023", Some(15249), "Engineering Svcs"), "6ENGSVC15249");
        assert_eq!(resource_code("6603023.0", Some(0), "Engineering Svcs"), "6ENGSVC");
        assert_eq!(resource_code("5490000", None, "Contracts"), "6Contract");
    }

    #[test]
    fn test_abbreviation_fallback_from_name() {
        assert_eq!(abbreviation("5123456", "Pipe fittings bulk"), "PIPFIT");
        assert_eq!(abbreviation("5123456", "Permits"), "PERMIT");
        assert_eq!(abbreviation("Labor Alloc.", ""), "Labor OH");
    }

    #[test]
    fn test_display_resource_strips_prefix() {
        assert_eq!(display_resource("6ENGSVC15249"), "ENGSVC15249");
        assert_eq!(display_resource("ENGSVC15249"), "ENGSVC15249");
    }
}
