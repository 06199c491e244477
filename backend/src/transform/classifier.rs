//! Design-stage classification of part groups.
//!
//! The decision procedure looks at one part group (text fields from its
//! representative row, mass from the whole group) plus the other part groups
//! of the same serial, and walks an ordered list of rules. The first rule that
//! matches decides.
//!
//! | # | rule | outcome |
//! |---|------|---------|
//! | 1 | summary mentions `MS` / `MS-` / `JIS` | excluded |
//! | 2 | supply `ES`/`SU`/`ST`/`CS`: not a roll, or a roll bearing | excluded |
//! | 3 | mass ≥ 3000 | Ds |
//! | 4 | not common steel, mass ≥ 400 | Ds |
//! | 5 | common steel, a non-common sibling ≥ 300 | Ds |
//! | 6 | `SCM`/`SF` material, mass ≥ 300 | Ds |
//! | 7 | not common steel, mass ≥ 100 | Dm |
//! | 8 | thickness ≥ 80 and a group of the serial ≥ 300 | Ds |
//! | 9 | mass ≥ 500 | Dm |
//! | 10 | name mentions `PIPE` / `PIPING` | PD |
//! | 11 | mass < 50 | PD |
//! | 12 | otherwise | unresolved |
//!
//! Common steel is any material containing `SPCC`, `SPHC` or `SS`.

use serde::{Deserialize, Serialize};

use super::coerce::parse_thickness;
use super::grouper::{PartGroup, SerialGroup};
use crate::error::{ClassifyError, ClassifyResult};
use crate::models::{BomRow, Category};

pub const HEAVY_PART_MASS: f64 = 3000.0;
pub const NON_COMMON_HEAVY_MASS: f64 = 400.0;
pub const SIBLING_HEAVY_MASS: f64 = 300.0;
pub const SPECIAL_ALLOY_MASS: f64 = 300.0;
pub const NON_COMMON_MID_MASS: f64 = 100.0;
pub const THICK_PLATE_MM: u64 = 80;
pub const MID_WEIGHT_MASS: f64 = 500.0;
pub const LIGHT_PART_MASS: f64 = 50.0;

const SUMMARY_MARKERS: [&str; 3] = ["MS-", "MS", "JIS"];
const SUPPLY_CODES: [&str; 4] = ["ES", "SU", "ST", "CS"];
const ROLL_NAMES: [&str; 2] = ["ROLL", "ROLLER"];
const BEARING_NAMES: [&str; 2] = ["BRG", "BEARING"];
const COMMON_STEELS: [&str; 3] = ["SPCC", "SPHC", "SS"];
const SPECIAL_ALLOYS: [&str; 2] = ["SCM", "SF"];
const PIPE_NAMES: [&str; 2] = ["PIPE", "PIPING"];

/// Result of the decision procedure for one group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "category", rename_all = "lowercase")]
pub enum Outcome {
    /// Final category.
    Category(Category),
    /// No rule placed the group; the allocator decides between Dm and De.
    Unresolved,
    /// Left out of every total.
    Excluded,
}

/// Which step of the procedure decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    SummaryMarker,
    SupplyGate,
    HeavyPart,
    NonCommonHeavy,
    SiblingHeavy,
    SpecialAlloy,
    NonCommonMid,
    ThickPlate,
    MidWeight,
    Piping,
    LightPart,
    Fallback,
}

impl Rule {
    /// Step number in the procedure (1-based).
    pub fn step(&self) -> u8 {
        match self {
            Rule::SummaryMarker => 1,
            Rule::SupplyGate => 2,
            Rule::HeavyPart => 3,
            Rule::NonCommonHeavy => 4,
            Rule::SiblingHeavy => 5,
            Rule::SpecialAlloy => 6,
            Rule::NonCommonMid => 7,
            Rule::ThickPlate => 8,
            Rule::MidWeight => 9,
            Rule::Piping => 10,
            Rule::LightPart => 11,
            Rule::Fallback => 12,
        }
    }
}

/// Outcome plus the rule that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub outcome: Outcome,
    pub rule: Rule,
}

impl Decision {
    fn new(outcome: Outcome, rule: Rule) -> Self {
        Self { outcome, rule }
    }

    fn category(category: Category, rule: Rule) -> Self {
        Self::new(Outcome::Category(category), rule)
    }
}

/// Upper-cased text fields of a representative row.
struct Features {
    material: String,
    supply: String,
    summary: String,
    parts_name: String,
    size: String,
}

impl Features {
    fn of(row: &BomRow) -> Self {
        Self {
            material: row.material.to_uppercase(),
            supply: row.supply_code.to_uppercase(),
            summary: row.summary_text.to_uppercase(),
            parts_name: row.parts_name.to_uppercase(),
            size: row.size_text.to_uppercase(),
        }
    }
}

fn contains_any(text: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| text.contains(n))
}

/// Whether a material string denotes common structural steel.
pub fn is_common_steel(material: &str) -> bool {
    contains_any(&material.to_uppercase(), &COMMON_STEELS)
}

/// Classify one part group.
///
/// `serial` is the serial group the part belongs to; its other groups feed
/// the sibling rules (5 and 8). Pure: the same inputs always give the same
/// decision.
pub fn classify(group: &PartGroup<'_>, serial: &SerialGroup<'_>) -> ClassifyResult<Decision> {
    let row = group.representative().ok_or_else(|| ClassifyError::EmptyGroup {
        serial: group.serial_id.clone(),
        parts: group.parts_id.clone(),
    })?;

    let mass = group.total_mass;
    if !mass.is_finite() {
        return Err(ClassifyError::NonFiniteMass {
            serial: group.serial_id.clone(),
            parts: group.parts_id.clone(),
        });
    }

    let f = Features::of(row);

    // 1. Standard parts
    if contains_any(&f.summary, &SUMMARY_MARKERS) {
        return Ok(Decision::new(Outcome::Excluded, Rule::SummaryMarker));
    }

    // 2. Supplied parts: only rolls without bearings continue
    if contains_any(&f.supply, &SUPPLY_CODES) {
        let is_roll = contains_any(&f.parts_name, &ROLL_NAMES);
        let is_bearing = contains_any(&f.parts_name, &BEARING_NAMES);
        if !is_roll || is_bearing {
            return Ok(Decision::new(Outcome::Excluded, Rule::SupplyGate));
        }
    }

    // 3.
    if mass >= HEAVY_PART_MASS {
        return Ok(Decision::category(Category::Ds, Rule::HeavyPart));
    }

    let common_steel = contains_any(&f.material, &COMMON_STEELS);

    // 4.
    if !common_steel && mass >= NON_COMMON_HEAVY_MASS {
        return Ok(Decision::category(Category::Ds, Rule::NonCommonHeavy));
    }

    // 5.
    if common_steel && has_heavy_non_common_sibling(serial) {
        return Ok(Decision::category(Category::Ds, Rule::SiblingHeavy));
    }

    // 6.
    if contains_any(&f.material, &SPECIAL_ALLOYS) && mass >= SPECIAL_ALLOY_MASS {
        return Ok(Decision::category(Category::Ds, Rule::SpecialAlloy));
    }

    // 7.
    if !common_steel && mass >= NON_COMMON_MID_MASS {
        return Ok(Decision::category(Category::Dm, Rule::NonCommonMid));
    }

    // 8.
    if parse_thickness(&f.size).is_some_and(|t| t >= THICK_PLATE_MM)
        && serial.parts.iter().any(|p| p.total_mass >= SIBLING_HEAVY_MASS)
    {
        return Ok(Decision::category(Category::Ds, Rule::ThickPlate));
    }

    // 9.
    if mass >= MID_WEIGHT_MASS {
        return Ok(Decision::category(Category::Dm, Rule::MidWeight));
    }

    // 10.
    if contains_any(&f.parts_name, &PIPE_NAMES) {
        return Ok(Decision::category(Category::Pd, Rule::Piping));
    }

    // 11.
    if mass < LIGHT_PART_MASS {
        return Ok(Decision::category(Category::Pd, Rule::LightPart));
    }

    Ok(Decision::new(Outcome::Unresolved, Rule::Fallback))
}

fn has_heavy_non_common_sibling(serial: &SerialGroup<'_>) -> bool {
    serial.parts.iter().any(|sibling| {
        let material = sibling.representative().map(|r| r.material.as_str()).unwrap_or("");
        !is_common_steel(material) && sibling.total_mass >= SIBLING_HEAVY_MASS
    })
}
