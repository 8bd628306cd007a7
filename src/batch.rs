//! Batch generation over many branch rows
//!
//! Rows use the column names of the bulk upload sheet:
//!
//! | Column | Meaning | Blank / missing |
//! |--------|---------|-----------------|
//! | `Branch` | Branch number | row skipped |
//! | `Region` | Region display name | row skipped |
//! | `Peer IP` | Primary peer | `dynamic` |
//! | `Subnets` | Subnet override | derived from branch |
//! | `PSK` | Primary pre-shared key | empty key |
//! | `Enable Backup` | `true`/`yes`/`1`/`on` enables | disabled |
//! | `Backup Peer IP` | Backup peer | `dynamic` |
//! | `Backup PSK` | Backup pre-shared key | primary key |
//! | `SPN` | SPN override | region default |
//!
//! Row files are TOML (`[[rows]]` tables) or JSON (an array of objects, or
//! an object with a `rows` array). Per-row problems never stop a run; only
//! an unreadable file does.

use crate::assemble::{Assembler, BranchInput};
use crate::config::Config;
use crate::peer;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Reason recorded for rows without a branch number or region
pub const MISSING_FIELDS_REASON: &str = "Missing Branch or Region";

const TRUTHY: &[&str] = &["true", "yes", "1", "on"];

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Failed to read input file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Failed to parse TOML input: {0}")]
    TomlError(#[from] toml::de::Error),
    #[error("Failed to serialize TOML: {0}")]
    SerializeError(#[from] toml::ser::Error),
    #[error("Failed to parse JSON input: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Unsupported input format: {0}")]
    UnsupportedFormat(String),
}

/// Row file encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Toml,
    Json,
}

impl InputFormat {
    /// Pick the format from a file extension
    pub fn from_path(path: &Path) -> Result<Self, BatchError> {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();
        ext.parse()
    }
}

impl FromStr for InputFormat {
    type Err = BatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "toml" => Ok(InputFormat::Toml),
            "json" => Ok(InputFormat::Json),
            _ => Err(BatchError::UnsupportedFormat(s.to_string())),
        }
    }
}

/// A single cell as it appears in a row file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Text(String),
    Integer(i64),
    /// JSON integers above `i64::MAX`
    Unsigned(u64),
    Float(f64),
    Bool(bool),
}

impl Cell {
    fn to_text(&self) -> String {
        match self {
            Cell::Text(s) => s.trim().to_string(),
            Cell::Integer(i) => i.to_string(),
            Cell::Unsigned(u) => u.to_string(),
            Cell::Float(f) => f.to_string(),
            Cell::Bool(b) => b.to_string(),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

/// One raw input row, before normalization
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputRow {
    #[serde(rename = "Branch", default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<Cell>,
    #[serde(rename = "Region", default, skip_serializing_if = "Option::is_none")]
    pub region: Option<Cell>,
    #[serde(rename = "Peer IP", default, skip_serializing_if = "Option::is_none")]
    pub peer_ip: Option<Cell>,
    #[serde(rename = "Subnets", default, skip_serializing_if = "Option::is_none")]
    pub subnets: Option<Cell>,
    #[serde(rename = "PSK", default, skip_serializing_if = "Option::is_none")]
    pub psk: Option<Cell>,
    #[serde(rename = "Enable Backup", default, skip_serializing_if = "Option::is_none")]
    pub enable_backup: Option<Cell>,
    #[serde(rename = "Backup Peer IP", default, skip_serializing_if = "Option::is_none")]
    pub backup_peer_ip: Option<Cell>,
    #[serde(rename = "Backup PSK", default, skip_serializing_if = "Option::is_none")]
    pub backup_psk: Option<Cell>,
    #[serde(rename = "SPN", default, skip_serializing_if = "Option::is_none")]
    pub spn: Option<Cell>,
}

fn text(cell: &Option<Cell>) -> String {
    cell.as_ref().map(Cell::to_text).unwrap_or_default()
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}

fn or_dynamic(value: String) -> String {
    if value.is_empty() {
        peer::DYNAMIC.to_string()
    } else {
        value
    }
}

/// Interpret an `Enable Backup` cell
pub fn parse_flag(value: &str) -> bool {
    let value = value.trim().to_ascii_lowercase();
    TRUTHY.contains(&value.as_str())
}

impl InputRow {
    /// Trim and default every field
    ///
    /// Returns `None` when the branch number or region is blank.
    pub fn normalize(&self) -> Option<BranchInput> {
        let branch = text(&self.branch);
        let region = text(&self.region);
        if branch.is_empty() || region.is_empty() {
            return None;
        }

        Some(BranchInput {
            branch,
            region,
            subnets: non_empty(text(&self.subnets)),
            psk: text(&self.psk),
            peer_ip: or_dynamic(text(&self.peer_ip)),
            backup_enabled: parse_flag(&text(&self.enable_backup)),
            backup_peer_ip: or_dynamic(text(&self.backup_peer_ip)),
            backup_psk: non_empty(text(&self.backup_psk)),
            spn: non_empty(text(&self.spn)),
        })
    }
}

/// Row file layout
///
/// `rows` is required and no other top-level key is accepted, so a
/// misspelled table (`[[row]]`, `[[Rows]]`) is a parse error rather than an
/// empty batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatchFile {
    pub rows: Vec<InputRow>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonInput {
    Rows(Vec<InputRow>),
    File(BatchFile),
}

/// Parse rows from file content
pub fn parse_rows(content: &str, format: InputFormat) -> Result<Vec<InputRow>, BatchError> {
    let rows = match format {
        InputFormat::Toml => toml::from_str::<BatchFile>(content)?.rows,
        InputFormat::Json => match serde_json::from_str::<JsonInput>(content)? {
            JsonInput::Rows(rows) => rows,
            JsonInput::File(file) => file.rows,
        },
    };
    Ok(rows)
}

/// Read rows from a `.toml` or `.json` file
pub fn load_rows(path: &Path) -> Result<Vec<InputRow>, BatchError> {
    let format = InputFormat::from_path(path)?;
    let content = std::fs::read_to_string(path)?;
    let rows = parse_rows(&content, format)?;
    info!("Loaded {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueKind {
    /// Row not generated (missing branch or region)
    Skipped,
    /// Row produced a diagnostic line instead of a block
    Degraded,
}

/// A row that needs operator attention
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowIssue {
    /// 1-based position in the input
    pub row: usize,
    pub kind: IssueKind,
    pub reason: String,
}

impl fmt::Display for RowIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            IssueKind::Skipped => write!(f, "Row {}: Skipped ({})", self.row, self.reason),
            IssueKind::Degraded => write!(f, "Row {}: Error ({})", self.row, self.reason),
        }
    }
}

/// Outcome of a batch run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchResult {
    /// Generated text, blocks in input order separated by a blank line
    pub output: String,
    /// Number of complete blocks in `output`
    pub generated: usize,
    pub issues: Vec<RowIssue>,
}

impl BatchResult {
    pub fn skipped(&self) -> usize {
        self.issues
            .iter()
            .filter(|issue| issue.kind == IssueKind::Skipped)
            .count()
    }

    pub fn summary(&self) -> String {
        format!(
            "blocks: {}, skipped: {}, errors: {}",
            self.generated,
            self.skipped(),
            self.issues.len() - self.skipped()
        )
    }
}

/// Generate blocks for every row, in order
pub fn run(config: &Config, rows: &[InputRow]) -> BatchResult {
    let assembler = Assembler::new(config);
    let mut result = BatchResult::default();

    for (index, row) in rows.iter().enumerate() {
        let position = index + 1;

        let Some(input) = row.normalize() else {
            warn!("Row {}: skipped ({})", position, MISSING_FIELDS_REASON);
            result.issues.push(RowIssue {
                row: position,
                kind: IssueKind::Skipped,
                reason: MISSING_FIELDS_REASON.to_string(),
            });
            continue;
        };

        match assembler.assemble(&input) {
            Ok(block) => {
                debug!("Row {}: generated branch {}", position, input.branch);
                result.output.push_str(&block.render());
                result.generated += 1;
            }
            Err(e) => {
                warn!("Row {}: {}", position, e);
                result.output.push_str(&e.diagnostic_line());
                result.output.push('\n');
                result.issues.push(RowIssue {
                    row: position,
                    kind: IssueKind::Degraded,
                    reason: e.to_string(),
                });
            }
        }
        result.output.push('\n');
    }

    info!("Batch complete ({})", result.summary());
    result
}

/// Example rows offered as a fill-in template
pub fn sample_rows() -> Vec<InputRow> {
    let row = |cells: [&str; 8]| InputRow {
        branch: Some(cells[0].into()),
        region: Some(cells[1].into()),
        peer_ip: Some(cells[2].into()),
        subnets: Some(cells[3].into()),
        psk: Some(cells[4].into()),
        enable_backup: Some(cells[5].into()),
        backup_peer_ip: Some(cells[6].into()),
        backup_psk: Some(cells[7].into()),
        spn: None,
    };

    vec![
        row(["510", "US West", "dynamic", "", "Key1", "False", "", ""]),
        row(["613", "US East", "1.2.3.4", "", "Key2", "True", "5.6.7.8", "Key2Backup"]),
        row(["353", "US Central", "dynamic", "10.3.53.0/24", "Key3", "True", "dynamic", ""]),
    ]
}

/// Serialize the sample rows
pub fn render_sample(format: InputFormat) -> Result<String, BatchError> {
    let file = BatchFile {
        rows: sample_rows(),
    };
    let content = match format {
        InputFormat::Toml => toml::to_string_pretty(&file)?,
        InputFormat::Json => serde_json::to_string_pretty(&file)?,
    };
    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble::ERROR_PREFIX;
    use tempfile::TempDir;

    fn row(branch: &str, region: &str, psk: &str) -> InputRow {
        InputRow {
            branch: Some(branch.into()),
            region: Some(region.into()),
            psk: Some(psk.into()),
            ..InputRow::default()
        }
    }

    #[test]
    fn test_parse_flag() {
        for value in ["true", "True", "YES", "1", "on", " On "] {
            assert!(parse_flag(value), "{value} should enable backup");
        }
        for value in ["", "false", "no", "0", "off", "enabled", "2"] {
            assert!(!parse_flag(value), "{value} should not enable backup");
        }
    }

    #[test]
    fn test_normalize_defaults() {
        let input = row(" 510 ", "US West", " K1 ").normalize().unwrap();
        assert_eq!(input.branch, "510");
        assert_eq!(input.psk, "K1");
        assert_eq!(input.peer_ip, "dynamic");
        assert_eq!(input.subnets, None);
        assert!(!input.backup_enabled);
        assert_eq!(input.backup_peer_ip, "dynamic");
        assert_eq!(input.backup_psk, None);
        assert_eq!(input.spn, None);
    }

    #[test]
    fn test_normalize_blank_fields() {
        let raw = InputRow {
            peer_ip: Some("  ".into()),
            subnets: Some("".into()),
            backup_peer_ip: Some("".into()),
            backup_psk: Some(" ".into()),
            ..row("510", "US West", "K1")
        };
        let input = raw.normalize().unwrap();
        assert_eq!(input.peer_ip, "dynamic");
        assert_eq!(input.subnets, None);
        assert_eq!(input.backup_peer_ip, "dynamic");
        assert_eq!(input.backup_psk, None);
    }

    #[test]
    fn test_normalize_non_text_cells() {
        let raw = InputRow {
            branch: Some(Cell::Integer(613)),
            enable_backup: Some(Cell::Bool(true)),
            ..row("", "US East", "Key2")
        };
        let input = raw.normalize().unwrap();
        assert_eq!(input.branch, "613");
        assert!(input.backup_enabled);
    }

    #[test]
    fn test_normalize_missing_required() {
        assert!(row("", "US East", "k").normalize().is_none());
        assert!(row("510", "  ", "k").normalize().is_none());
        assert!(InputRow::default().normalize().is_none());
    }

    #[test]
    fn test_run_skips_missing_branch() {
        let config = Config::default();
        let rows = vec![
            InputRow {
                peer_ip: Some("".into()),
                enable_backup: Some("false".into()),
                ..row("510", "US West", "K1")
            },
            row("", "US East", "K2"),
        ];

        let result = run(&config, &rows);

        assert_eq!(result.generated, 1);
        assert_eq!(
            result.issues,
            vec![RowIssue {
                row: 2,
                kind: IssueKind::Skipped,
                reason: MISSING_FIELDS_REASON.to_string(),
            }]
        );
        assert_eq!(result.generated + result.skipped(), rows.len());
        assert!(result.output.contains("# BRANCH 510 [US West]"));
        assert!(!result.output.contains("US East"));
        assert_eq!(result.issues[0].to_string(), "Row 2: Skipped (Missing Branch or Region)");
    }

    #[test]
    fn test_run_preserves_order_and_separates_blocks() {
        let config = Config::default();
        let rows = vec![
            row("300", "US Central", "a"),
            row("100", "US East", "b"),
            row("200", "US West", "c"),
        ];

        let result = run(&config, &rows);
        let first = result.output.find("BRANCH 300").unwrap();
        let second = result.output.find("BRANCH 100").unwrap();
        let third = result.output.find("BRANCH 200").unwrap();
        assert!(first < second && second < third);
        assert!(result.output.contains("license-type FWAAS-AGGREGATE\n\n# ----"));
        assert!(result.issues.is_empty());
    }

    #[test]
    fn test_run_unknown_region_continues() {
        let config = Config::default();
        let rows = vec![row("1", "Nowhere", "a"), row("2", "US Central", "b")];

        let result = run(&config, &rows);

        assert_eq!(result.generated, 1);
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].row, 1);
        assert_eq!(result.issues[0].kind, IssueKind::Degraded);
        assert!(result.output.starts_with(ERROR_PREFIX));
        assert!(result.output.contains("# BRANCH 2 [US Central]"));
        assert_eq!(result.summary(), "blocks: 1, skipped: 0, errors: 1");
    }

    #[test]
    fn test_run_psk_with_line_break_is_degraded() {
        let config = Config::default();
        let rows = vec![row("1", "US Central", "ab\ncd"), row("2", "US Central", "ab\tcd")];

        let result = run(&config, &rows);

        assert_eq!(result.generated, 1);
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].row, 1);
        assert_eq!(result.issues[0].kind, IssueKind::Degraded);
        assert!(result.issues[0].reason.contains("PSK for branch 1"));
        assert!(result.output.starts_with(ERROR_PREFIX));
        assert!(result.output.contains("b2-ikegw-pri authentication pre-shared-key key \"ab\tcd\""));
    }

    #[test]
    fn test_run_backup_row() {
        let config = Config::default();
        let rows = vec![InputRow {
            enable_backup: Some("Yes".into()),
            backup_peer_ip: Some("5.6.7.8".into()),
            ..row("613", "US East", "Key2")
        }];

        let result = run(&config, &rows);
        assert!(result.output.contains("secondary-ipsec-tunnel b613-ipsec-bak"));
        assert!(result.output.contains("b613-ikegw-bak authentication pre-shared-key key Key2"));
    }

    #[test]
    fn test_run_empty() {
        let result = run(&Config::default(), &[]);
        assert!(result.output.is_empty());
        assert_eq!(result.generated, 0);
        assert!(result.issues.is_empty());
    }

    #[test]
    fn test_parse_toml_rows() {
        let content = r#"
[[rows]]
Branch = "510"
Region = "US West"
"Peer IP" = ""
PSK = "Key1"
"Enable Backup" = false

[[rows]]
Branch = 613
Region = "US East"
"Peer IP" = "1.2.3.4"
PSK = "Key2"
"Enable Backup" = "True"
"Backup Peer IP" = "5.6.7.8"
"#;
        let rows = parse_rows(content, InputFormat::Toml).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].enable_backup, Some(Cell::Bool(false)));
        assert_eq!(rows[1].branch, Some(Cell::Integer(613)));

        let second = rows[1].normalize().unwrap();
        assert!(second.backup_enabled);
        assert_eq!(second.backup_peer_ip, "5.6.7.8");
    }

    #[test]
    fn test_parse_json_rows() {
        let array = r#"[{"Branch": "510", "Region": "US West", "PSK": "K1", "Subnets": null}]"#;
        let rows = parse_rows(array, InputFormat::Json).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].subnets, None);

        let object = r#"{"rows": [{"Branch": 353, "Region": "US Central"}]}"#;
        let rows = parse_rows(object, InputFormat::Json).unwrap();
        assert_eq!(rows[0].normalize().unwrap().branch, "353");
    }

    #[test]
    fn test_parse_invalid_input() {
        assert!(matches!(
            parse_rows("[[rows]\n", InputFormat::Toml),
            Err(BatchError::TomlError(_))
        ));
        assert!(matches!(
            parse_rows("{not json", InputFormat::Json),
            Err(BatchError::JsonError(_))
        ));
    }

    #[test]
    fn test_parse_wrong_structure() {
        let misnamed = [
            "[[Rows]]\nBranch = \"510\"\nRegion = \"US West\"\n",
            "[[row]]\nBranch = \"510\"\nRegion = \"US West\"\n",
            "Branch = \"510\"\nRegion = \"US West\"\n",
            "",
        ];
        for content in misnamed {
            assert!(
                matches!(parse_rows(content, InputFormat::Toml), Err(BatchError::TomlError(_))),
                "accepted {content:?}"
            );
        }

        let single_object = r#"{"Branch": "510", "Region": "US West"}"#;
        assert!(matches!(
            parse_rows(single_object, InputFormat::Json),
            Err(BatchError::JsonError(_))
        ));
        let misnamed_key = r#"{"Rows": [{"Branch": "510", "Region": "US West"}]}"#;
        assert!(matches!(
            parse_rows(misnamed_key, InputFormat::Json),
            Err(BatchError::JsonError(_))
        ));

        let empty = parse_rows("rows = []\n", InputFormat::Toml).unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_parse_large_json_branch() {
        let content = r#"[{"Branch": 18446744073709551615, "Region": "US East"}]"#;
        let rows = parse_rows(content, InputFormat::Json).unwrap();
        assert_eq!(rows[0].branch, Some(Cell::Unsigned(u64::MAX)));
        assert_eq!(rows[0].normalize().unwrap().branch, "18446744073709551615");
    }

    #[test]
    fn test_input_format_from_path() {
        assert_eq!(
            InputFormat::from_path(Path::new("rows.toml")).unwrap(),
            InputFormat::Toml
        );
        assert_eq!(
            InputFormat::from_path(Path::new("rows.JSON")).unwrap(),
            InputFormat::Json
        );
        assert!(matches!(
            InputFormat::from_path(Path::new("rows.csv")),
            Err(BatchError::UnsupportedFormat(_))
        ));
        assert!(InputFormat::from_path(Path::new("rows")).is_err());
    }

    #[test]
    fn test_load_rows_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("branches.toml");
        std::fs::write(&path, "[[rows]]\nBranch = \"7\"\nRegion = \"US Southeast\"\n").unwrap();

        let rows = load_rows(&path).unwrap();
        assert_eq!(rows.len(), 1);

        let missing = temp_dir.path().join("absent.toml");
        assert!(matches!(load_rows(&missing), Err(BatchError::ReadError(_))));
    }

    #[test]
    fn test_sample_rows() {
        let rows = sample_rows();
        assert_eq!(rows.len(), 3);

        let result = run(&Config::default(), &rows);
        assert_eq!(result.generated, 3);
        assert!(result.issues.is_empty());
        assert!(!result.output.contains("b510-ikegw-bak"));
        assert!(result.output.contains("b613-ikegw-bak authentication pre-shared-key key Key2Backup"));
        assert!(result.output.contains("b353-ikegw-bak authentication pre-shared-key key Key3"));
        assert!(result.output.contains("onboarding b353-rn-us-central subnets [ 10.3.53.0/24 ]"));
    }

    #[test]
    fn test_render_sample_parses_back() {
        for format in [InputFormat::Toml, InputFormat::Json] {
            let content = render_sample(format).unwrap();
            assert!(content.contains("Backup Peer IP"));
            assert_eq!(parse_rows(&content, format).unwrap(), sample_rows());
        }
    }
}
