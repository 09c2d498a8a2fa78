//! Static SAP operation → HeavyBid activity table for Gas Transmission WBS.

use std::collections::{BTreeSet, HashMap};
use std::sync::OnceLock;

/// SAP operation that carries AFUDC postings. It has no WBS activity of its
/// own; its totals are booked against [`AFUDC_BID_ITEM`].
pub const AFUDC_OPERATION: i64 = 1;
pub const AFUDC_BID_ITEM: u32 = 1010;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationEntry {
    pub code: u32,
    pub activity: &'static str,
    pub level2: &'static str,
    pub level3: &'static str,
}

const fn op(
    code: u32,
    activity: &'static str,
    level2: &'static str,
    level3: &'static str,
) -> OperationEntry {
    OperationEntry {
        code,
        activity,
        level2,
        level3,
    }
}

pub const OPERATIONS: &[OperationEntry] = &[
    op(1010, "0101-1010A", "01", "01"),
    op(1020, "0101-1020A", "01", "01"),
    op(1030, "0101-1030A", "01", "01"),
    op(1040, "0101-1040A", "01", "01"),
    op(1100, "0102-1100A", "01", "02"),
    op(1110, "0102-1110A", "01", "02"),
    op(1120, "0102-1120A", "01", "02"),
    op(1130, "0102-1130A", "01", "02"),
    op(1140, "0102-1140A", "01", "02"),
    op(1190, "0102-1190A", "01", "02"),
    op(2010, "0201-2010A", "02", "01"),
    op(2110, "0202-2110A", "02", "02"),
    op(2210, "0203-2210A", "02", "03"),
    op(3010, "0301-3010A", "03", "01"),
    op(3020, "0301-3020A", "03", "01"),
    op(3030, "0301-3030A", "03", "01"),
    op(3100, "0302-3100A", "03", "02"),
    op(3110, "0302-3110A", "03", "02"),
    op(3150, "0302-3150A", "03", "02"),
    op(3210, "0303-3210A", "03", "03"),
    op(4010, "0401-4010A", "04", "01"),
    op(4030, "0401-4030A", "04", "01"),
    op(4040, "0401-4040A", "04", "01"),
    op(4050, "0401-4050A", "04", "01"),
    op(4060, "0401-4060A", "04", "01"),
    op(4070, "0401-4070A", "04", "01"),
    op(4110, "0402-4110A", "04", "02"),
    op(4200, "0403-4200A", "04", "03"),
    op(4210, "0403-4210A", "04", "03"),
    op(4220, "0403-4220A", "04", "03"),
    op(5010, "0501-5010A", "05", "01"),
    op(5020, "0501-5020A", "05", "01"),
    op(5030, "0502-5030A", "05", "02"),
    op(5040, "0503-5040A", "05", "03"),
    op(5050, "0503-5050A", "05", "03"),
    op(5060, "0503-5060A", "05", "03"),
    op(5070, "0503-5070A", "05", "03"),
    op(5080, "0503-5080A", "05", "03"),
    op(5085, "0503-5085A", "05", "03"),
    op(5090, "0503-5090A", "05", "03"),
    op(6000, "0504-6000A", "05", "04"),
    op(6050, "0504-6050A", "05", "04"),
    op(6100, "0504-6100A", "05", "04"),
    op(6200, "0504-6200A", "05", "04"),
    op(6300, "0504-6300A", "05", "04"),
    op(6400, "0504-6400A", "05", "04"),
    op(6500, "0504-6500A", "05", "04"),
    op(6600, "0504-6600A", "05", "04"),
    op(6700, "0504-6700A", "05", "04"),
    op(6800, "0504-6800A", "05", "04"),
    op(6900, "0504-6900A", "05", "04"),
    op(7000, "0504-7000A", "05", "04"),
    op(7100, "0504-7100A", "05", "04"),
    op(7200, "0504-7200A", "05", "04"),
    op(7300, "0504-7300A", "05", "04"),
    op(7400, "0504-7400A", "05", "04"),
    op(7500, "0504-7500A", "05", "04"),
    op(7600, "0504-7600A", "05", "04"),
    op(7700, "0504-7700A", "05", "04"),
    op(7800, "0505-7800A", "05", "05"),
    op(7900, "0505-7900A", "05", "05"),
    op(8000, "0505-8000A", "05", "05"),
    op(8100, "0505-8100A", "05", "05"),
    op(8200, "0506-8200A", "05", "06"),
    op(8300, "0506-8300A", "05", "06"),
    op(8400, "0507-8400A", "05", "07"),
    op(8500, "0507-8500A", "05", "07"),
    op(8600, "0507-8600A", "05", "07"),
    op(8700, "0508-8700A", "05", "08"),
    op(8800, "0508-8800A", "05", "08"),
    op(9010, "0601-9010A", "06", "01"),
    op(9110, "0602-9110A", "06", "02"),
    op(9120, "0602-9120A", "06", "02"),
    op(9130, "0602-9130A", "06", "02"),
];

fn index() -> &'static HashMap<u32, &'static OperationEntry> {
    static INDEX: OnceLock<HashMap<u32, &'static OperationEntry>> = OnceLock::new();
    INDEX.get_or_init(|| OPERATIONS.iter().map(|e| (e.code, e)).collect())
}

pub fn lookup(code: u32) -> Option<&'static OperationEntry> {
    index().get(&code).copied()
}

/// Lookup for a raw SAP operation value, which may be negative or too large
/// to be a table code.
pub fn lookup_raw(code: i64) -> Option<&'static OperationEntry> {
    u32::try_from(code).ok().and_then(lookup)
}

pub fn is_valid_operation(code: i64) -> bool {
    lookup_raw(code).is_some()
}

pub fn all_codes() -> BTreeSet<u32> {
    OPERATIONS.iter().map(|e| e.code).collect()
}

/// AFUDC lines sit on a sibling activity whose operation number ends in 1
/// instead of 0: `0101-1010A` becomes `0101-1011A`.
pub fn afudc_activity(entry: &OperationEntry) -> String {
    let chars: Vec<char> = entry.activity.chars().collect();
    let n = chars.len();
    if n >= 2 && chars[n - 2] == '0' {
        let mut out: String = chars[..n - 2].iter().collect();
        out.push('1');
        out.push(chars[n - 1]);
        out
    } else {
        entry.activity.to_string()
    }
}
