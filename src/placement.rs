//! Keystroke → window geometry mapping.
//!
//! Every placement key selects a horizontal slice of the monitor: the slice
//! starts at `start` (a fraction of the usable width) and is `width` wide.
//! Vertically the window always fills the monitor minus the padding and the
//! space kept free for the menu bar.
//!
//! The table is fixed.  It is checked for duplicate keys at compile time,
//! built once, and shared through [`PlacementTable::standard`].
//!
//! # Arithmetic
//!
//! ```text
//! available = monitor.width - PADDING
//! x         = floor(start * available + PADDING)
//! y         = floor(monitor.y + 2 * PADDING)
//! width     = floor(available * width - PADDING)
//! height    = floor(monitor.height - MENU_OFFSET - 2 * PADDING)
//! ```
//!
//! `monitor.y` is part of `y` but `monitor.x` is not part of `x`.  Callers
//! that want the horizontal offset applied use [`TargetRect::translate`].

use crate::command::{MonitorGeometry, TargetRect};
use std::collections::HashSet;
use std::fmt;
use std::sync::OnceLock;

/// Gap kept between the window and the monitor edges (pixels).
pub const PADDING: i32 = 32;

/// Vertical space reserved for the menu bar (pixels).
pub const MENU_OFFSET: i32 = 32;

/// A non-negative rational number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fraction {
    pub num: u32,
    pub den: u32,
}

impl Fraction {
    pub const fn new(num: u32, den: u32) -> Self {
        Self { num, den }
    }

    pub fn as_f64(self) -> f64 {
        self.num as f64 / self.den as f64
    }
}

impl fmt::Display for Fraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

/// One entry of the placement table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementRule {
    /// Lower-case key that selects this rule.
    pub key: char,
    /// Where the window's left edge starts.
    pub start: Fraction,
    /// How wide the window is.
    pub width: Fraction,
    /// Text shown next to the key in the menu.
    pub label: &'static str,
}

const fn rule(key: char, start: (u32, u32), width: (u32, u32), label: &'static str) -> PlacementRule {
    PlacementRule {
        key,
        start: Fraction::new(start.0, start.1),
        width: Fraction::new(width.0, width.1),
        label,
    }
}

/// The built-in rules.  `start + width` is never checked against `1`.
const RULES: [PlacementRule; 16] = [
    rule(' ', (0, 1), (1, 1), "Full width"),
    rule('q', (0, 1), (1, 2), "Left 1/2"),
    rule('w', (1, 4), (1, 4), "Second 1/4"),
    rule('e', (1, 6), (2, 3), "Center 2/3"),
    rule('r', (1, 2), (1, 4), "Third 1/4"),
    rule('t', (1, 2), (1, 2), "Right 1/2"),
    rule('a', (0, 1), (1, 4), "Left 1/4"),
    rule('s', (0, 4), (3, 4), "Left 3/4"),
    rule('d', (1, 4), (1, 2), "Center 1/2"),
    rule('f', (1, 4), (3, 4), "Right 3/4"),
    rule('g', (3, 4), (1, 4), "Right 1/4"),
    rule('z', (0, 1), (1, 3), "Left 1/3"),
    rule('x', (0, 1), (2, 3), "Left 2/3"),
    rule('c', (1, 3), (1, 3), "Centered 1/3"),
    rule('v', (1, 3), (2, 3), "Right 2/3"),
    rule('b', (2, 3), (1, 3), "Right 1/3"),
];

/// What [`PlacementTable::new`] enforces, evaluated at compile time for
/// [`RULES`].  Keys must already be lower-case.
const fn rules_are_valid(rules: &[PlacementRule]) -> bool {
    let mut i = 0;
    while i < rules.len() {
        let r = &rules[i];
        if r.start.den == 0 || r.width.den == 0 || r.key.is_ascii_uppercase() {
            return false;
        }
        let mut j = i + 1;
        while j < rules.len() {
            if rules[j].key == r.key {
                return false;
            }
            j += 1;
        }
        i += 1;
    }
    true
}

const _: () = assert!(rules_are_valid(&RULES), "invalid built-in placement rules");

/// Keys in the on-screen menu, one inner array per column.
///
/// The space bar is not listed; it has no label in the menu.
pub const MENU_COLUMNS: [[char; 3]; 5] = [
    ['q', 'a', 'z'],
    ['w', 's', 'x'],
    ['e', 'd', 'c'],
    ['r', 'f', 'v'],
    ['t', 'g', 'b'],
];

/// Error from building a [`PlacementTable`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlacementError {
    #[error("duplicate placement key {0:?}")]
    DuplicateKey(char),
    #[error("placement key {0:?} has a zero denominator")]
    ZeroDenominator(char),
}

/// Immutable, validated set of [`PlacementRule`]s.
#[derive(Debug, Clone)]
pub struct PlacementTable {
    rules: Vec<PlacementRule>,
}

impl PlacementTable {
    /// Build a table, rejecting duplicate keys and zero denominators.
    ///
    /// Keys are stored lower-case.
    pub fn new(rules: impl IntoIterator<Item = PlacementRule>) -> Result<Self, PlacementError> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for mut r in rules {
            r.key = fold_key(r.key);
            if r.start.den == 0 || r.width.den == 0 {
                return Err(PlacementError::ZeroDenominator(r.key));
            }
            if !seen.insert(r.key) {
                return Err(PlacementError::DuplicateKey(r.key));
            }
            out.push(r);
        }
        Ok(Self { rules: out })
    }

    /// The built-in table, built on first use.
    pub fn standard() -> &'static PlacementTable {
        static TABLE: OnceLock<PlacementTable> = OnceLock::new();
        // `RULES` is checked at compile time.
        TABLE.get_or_init(|| PlacementTable {
            rules: RULES.to_vec(),
        })
    }

    /// Look up the rule for `key` (case-insensitive).
    pub fn get(&self, key: char) -> Option<&PlacementRule> {
        let key = fold_key(key);
        self.rules.iter().find(|r| r.key == key)
    }

    pub fn rules(&self) -> &[PlacementRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Compute the target rectangle for `key` on `monitor`, or `None` if the
    /// key has no rule.
    pub fn resolve(&self, key: char, monitor: &MonitorGeometry) -> Option<TargetRect> {
        self.get(key).map(|r| r.apply(monitor))
    }

    /// Menu labels laid out as columns (`"[Q]: Left 1/2"`).
    pub fn menu_layout(&self) -> MenuLayout {
        let columns: Vec<Vec<String>> = MENU_COLUMNS
            .iter()
            .map(|col| {
                col.iter()
                    .filter_map(|&k| self.get(k))
                    .map(|r| format!("[{}]: {}", r.key.to_ascii_uppercase(), r.label))
                    .collect()
            })
            .collect();
        MenuLayout { columns }
    }
}

impl PlacementRule {
    /// Apply this rule's fractions to `monitor`.
    pub fn apply(&self, monitor: &MonitorGeometry) -> TargetRect {
        let padding = PADDING as f64;
        let available = (monitor.width - PADDING) as f64;
        TargetRect {
            x: (self.start.as_f64() * available + padding).floor() as i32,
            y: (monitor.y as f64 + 2.0 * padding).floor() as i32,
            width: (available * self.width.as_f64() - padding).floor() as i32,
            height: monitor.height - MENU_OFFSET - 2 * PADDING,
        }
    }
}

/// Resolve `key` against the built-in table.
pub fn resolve(key: char, monitor: &MonitorGeometry) -> Option<TargetRect> {
    PlacementTable::standard().resolve(key, monitor)
}

/// Label text for the on-screen menu, column by column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuLayout {
    pub columns: Vec<Vec<String>>,
}

fn fold_key(c: char) -> char {
    let mut lower = c.to_lowercase();
    match (lower.next(), lower.next()) {
        (Some(l), None) => l,
        _ => c,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monitor() -> MonitorGeometry {
        MonitorGeometry {
            x: 100,
            y: 50,
            width: 1920,
            height: 1080,
        }
    }

    #[test]
    fn built_in_rules_pass_runtime_validation() {
        let checked = PlacementTable::new(RULES).unwrap();
        assert_eq!(checked.rules(), PlacementTable::standard().rules());
        assert!(rules_are_valid(&RULES));
    }

    #[test]
    fn const_check_rejects_what_new_rejects() {
        let dup = [RULES[1], RULES[1]];
        assert!(!rules_are_valid(&dup));
        assert_eq!(
            PlacementTable::new(dup).unwrap_err(),
            PlacementError::DuplicateKey('q')
        );

        let zero = [rule('k', (0, 0), (1, 2), "broken")];
        assert!(!rules_are_valid(&zero));
        assert_eq!(
            PlacementTable::new(zero).unwrap_err(),
            PlacementError::ZeroDenominator('k')
        );

        assert!(!rules_are_valid(&[rule('Q', (0, 1), (1, 2), "upper")]));
    }

    #[test]
    fn standard_table_has_sixteen_unique_keys() {
        let t = PlacementTable::standard();
        assert_eq!(t.len(), 16);
        let keys: HashSet<char> = t.rules().iter().map(|r| r.key).collect();
        assert_eq!(keys.len(), 16);
        assert!(keys.contains(&' '));
    }

    #[test]
    fn q_is_left_half() {
        let r = resolve('q', &monitor()).unwrap();
        assert_eq!(
            r,
            TargetRect {
                x: 32,
                y: 114,
                width: 912,
                height: 984,
            }
        );
    }

    #[test]
    fn c_is_centered_third() {
        let r = resolve('c', &monitor()).unwrap();
        assert_eq!(r.x, 661);
        assert_eq!(r.width, 597);
        assert_eq!(r.y, 114);
        assert_eq!(r.height, 984);
    }

    #[test]
    fn space_is_full_width() {
        let r = resolve(' ', &monitor()).unwrap();
        assert_eq!(r.x, 32);
        assert_eq!(r.width, 1856);
    }

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(resolve('Q', &monitor()), resolve('q', &monitor()));
        assert_eq!(resolve('B', &monitor()), resolve('b', &monitor()));
    }

    #[test]
    fn unknown_keys_resolve_to_none() {
        for k in ['y', '1', 'h', '?', '\n', 'ß'] {
            assert_eq!(resolve(k, &monitor()), None, "key {:?}", k);
        }
    }

    #[test]
    fn resolve_is_deterministic() {
        for rule in PlacementTable::standard().rules() {
            let a = resolve(rule.key, &monitor());
            let b = resolve(rule.key, &monitor());
            assert!(a.is_some());
            assert_eq!(a, b);
        }
    }

    #[test]
    fn monitor_x_is_not_added() {
        let mut m = monitor();
        m.x = 3840;
        assert_eq!(resolve('t', &m), resolve('t', &monitor()));
    }

    #[test]
    fn e_is_center_two_thirds() {
        let r = resolve('e', &monitor()).unwrap();
        assert_eq!(r.x, 346);
        assert_eq!(r.width, 1226);
    }

    #[test]
    fn tiny_monitor_gives_negative_size() {
        let m = MonitorGeometry {
            x: 0,
            y: 0,
            width: 40,
            height: 100,
        };
        let r = resolve('a', &m).unwrap();
        assert_eq!(r.width, -30);
        assert_eq!(r.height, 4);
    }

    #[test]
    fn duplicate_keys_rejected() {
        let rules = [
            rule('q', (0, 1), (1, 2), "Left 1/2"),
            rule('Q', (1, 2), (1, 2), "Right 1/2"),
        ];
        assert_eq!(
            PlacementTable::new(rules).unwrap_err(),
            PlacementError::DuplicateKey('q')
        );
    }

    #[test]
    fn zero_denominator_rejected() {
        let rules = [rule('k', (0, 0), (1, 2), "bad")];
        assert_eq!(
            PlacementTable::new(rules).unwrap_err(),
            PlacementError::ZeroDenominator('k')
        );
    }

    #[test]
    fn menu_layout_lists_every_lettered_rule() {
        let layout = PlacementTable::standard().menu_layout();
        assert_eq!(layout.columns.len(), 5);
        assert!(layout.columns.iter().all(|c| c.len() == 3));
        assert_eq!(layout.columns[0][0], "[Q]: Left 1/2");
        assert_eq!(layout.columns[2][2], "[C]: Centered 1/3");
        assert_eq!(layout.columns[4][2], "[B]: Right 1/3");
    }
}
