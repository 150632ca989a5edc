//! Shared Contracts fixture for unit tests.

use chrono::NaiveDate;

use crate::store::{CellValue, MemoryStore};

pub const CONTRACTS: &str = "Contracts";

pub const HEADERS: [&str; 12] = [
    "契約ID",
    "契約ステータス",
    "単価UP実現",
    "スタッフ名",
    "契約終了日",
    "テンプレ種別",
    "登録日時",
    "最終更新日",
    "完了フラグ",
    "単価UP反映日",
    "単価",
    "契約開始日",
];

/// Zero-based position of a fixture header.
pub fn col(name: &str) -> usize {
    HEADERS
        .iter()
        .position(|h| *h == name)
        .unwrap_or_else(|| panic!("no fixture column {name}"))
}

pub fn header_row() -> Vec<CellValue> {
    HEADERS.iter().map(|h| CellValue::text(*h)).collect()
}

fn date(y: i32, m: u32, d: u32) -> CellValue {
    CellValue::date(NaiveDate::from_ymd_opt(y, m, d).unwrap())
}

fn stamp(y: i32, m: u32, d: u32, h: u32, mi: u32) -> CellValue {
    CellValue::timestamp(
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, mi, 0)
            .unwrap(),
    )
}

/// Rows 2..=5:
/// - 2: 山田太郎, realized 〇, open, price 300000
/// - 3: 鈴木一郎, completed via text "TRUE"
/// - 4: 佐藤花子, blank unit-up, open
/// - 5: 田中三郎, rejected ×, completed via bool
pub fn contracts_store() -> MemoryStore {
    let rows = vec![
        header_row(),
        vec![
            CellValue::text("c-0001"),
            CellValue::text("ACTIVE"),
            CellValue::text("〇"),
            CellValue::text("山田太郎"),
            date(2025, 3, 15),
            CellValue::text("契約更新"),
            stamp(2025, 1, 10, 9, 15),
            stamp(2025, 1, 10, 9, 15),
            CellValue::Bool(false),
            CellValue::Empty,
            CellValue::Number(300000.0),
            date(2024, 4, 1),
        ],
        vec![
            CellValue::text("c-0002"),
            CellValue::text("ACTIVE"),
            CellValue::text("未"),
            CellValue::text("鈴木一郎"),
            date(2025, 4, 30),
            CellValue::text("単価変更"),
            stamp(2025, 1, 11, 10, 0),
            stamp(2025, 2, 1, 18, 30),
            CellValue::text("TRUE"),
            CellValue::Empty,
            CellValue::Empty,
            CellValue::Empty,
        ],
        vec![
            CellValue::text("c-0003"),
            CellValue::text("ACTIVE"),
            CellValue::Empty,
            CellValue::text("佐藤花子"),
            date(2025, 6, 30),
            CellValue::text("契約更新"),
            stamp(2025, 1, 12, 8, 0),
            stamp(2025, 1, 12, 8, 0),
            CellValue::Empty,
            CellValue::Empty,
            CellValue::Empty,
            CellValue::Empty,
        ],
        vec![
            CellValue::text("c-0004"),
            CellValue::text("ACTIVE"),
            CellValue::text("×"),
            CellValue::text("田中三郎"),
            date(2025, 5, 31),
            CellValue::text("情報変更"),
            stamp(2025, 1, 13, 8, 0),
            stamp(2025, 3, 1, 8, 0),
            CellValue::Bool(true),
            CellValue::Empty,
            CellValue::Empty,
            CellValue::Empty,
        ],
    ];
    MemoryStore::new().with_table(CONTRACTS, rows)
}
