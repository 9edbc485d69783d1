use anyhow::Result;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::conflict::ConflictKind;
use crate::entry::Entry;
use crate::rule::NamingRule;
use crate::validate::NameLimits;

/// Pipeline stage (or execution outcome) of a single step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Planned,
    Resolved,
    Validated,
    Committed,
    RolledBack,
    Failed,
    /// Left at its temporary name; needs `recover`
    Stranded,
}

/// One proposed source -> target mapping
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenameStep {
    pub source: PathBuf,
    /// Name the rule asked for
    pub candidate: String,
    /// Name the step will receive; differs from `candidate` once suffixed
    pub target: String,
    /// `_n` suffix added by the resolver, 0 when none
    pub conflict_suffix: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conflict: Option<ConflictKind>,
    pub status: StepStatus,
}

impl RenameStep {
    pub fn new(source: PathBuf, candidate: String) -> Self {
        Self {
            source,
            target: candidate.clone(),
            candidate,
            conflict_suffix: 0,
            conflict: None,
            status: StepStatus::Planned,
        }
    }

    pub fn directory(&self) -> &Path {
        self.source.parent().unwrap_or_else(|| Path::new(""))
    }

    pub fn source_name(&self) -> String {
        self.source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn target_path(&self) -> PathBuf {
        self.directory().join(&self.target)
    }

    pub fn is_auto_suffixed(&self) -> bool {
        self.conflict_suffix > 0
    }
}

/// Ordered set of rename steps for one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    pub id: String,
    pub created_at: String,
    pub rule: NamingRule,
    /// How the batch was ordered before numbering, e.g. "mtime" or "path"
    pub ordering: String,
    pub steps: Vec<RenameStep>,
    /// Entries the rule left alone (no match or already correctly named)
    pub unchanged: usize,
    /// Whether name comparison ignored case when resolving conflicts
    #[serde(default)]
    pub case_insensitive: bool,
    /// Limits the plan was validated against; temporary names stay within them
    #[serde(default)]
    pub limits: NameLimits,
}

impl Plan {
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn auto_suffixed(&self) -> impl Iterator<Item = &RenameStep> {
        self.steps.iter().filter(|s| s.is_auto_suffixed())
    }

    pub fn set_status(&mut self, status: StepStatus) {
        for step in &mut self.steps {
            step.status = status;
        }
    }
}

/// Apply `rule` to every entry in order, producing the raw (unresolved) plan.
///
/// Entries the rule does not apply to, or whose candidate equals their current
/// name, are omitted. No filesystem access.
pub fn build_plan(entries: &[Entry], rule: &NamingRule, ordering: &str) -> Plan {
    let mut steps = Vec::new();
    let mut unchanged = 0;

    for (index, entry) in entries.iter().enumerate() {
        match rule.propose(entry, index) {
            Some(candidate) if !candidate.is_empty() && candidate != entry.name => {
                steps.push(RenameStep::new(entry.path.clone(), candidate));
            },
            _ => unchanged += 1,
        }
    }

    Plan {
        id: generate_plan_id(rule, ordering, entries.len()),
        created_at: chrono::Local::now().to_rfc3339(),
        rule: rule.clone(),
        ordering: ordering.to_string(),
        steps,
        unchanged,
        case_insensitive: false,
        limits: NameLimits::default(),
    }
}

fn generate_plan_id(rule: &NamingRule, ordering: &str, entry_count: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(rule.to_string().as_bytes());
    hasher.update(ordering.as_bytes());
    hasher.update(entry_count.to_le_bytes());
    hasher.update(
        SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default()
            .to_le_bytes(),
    );
    format!("{:x}", hasher.finalize())[..16].to_string()
}

/// Where a live run saves its plan under the state directory
pub fn plan_file(state_dir: &Path, plan_id: &str) -> PathBuf {
    state_dir.join("plans").join(format!("{}.json", plan_id))
}

pub fn write_plan(plan: &Plan, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, plan)?;
    Ok(())
}

pub fn read_plan(path: &Path) -> Result<Plan> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::{ReplaceRule, SequenceRule};
    use std::time::{Duration, SystemTime};

    fn entry(path: &str, secs: u64) -> Entry {
        Entry::new(path, 0, SystemTime::UNIX_EPOCH + Duration::from_secs(secs))
    }

    #[test]
    fn test_build_skips_unmatched_and_already_named() {
        let rule = NamingRule::Sequence(SequenceRule::new(1, 0, "", "", true).unwrap());
        let entries = vec![entry("/d/1.jpg", 0), entry("/d/x.jpg", 1), entry("/d/y.jpg", 2)];

        let plan = build_plan(&entries, &rule, "mtime");

        assert_eq!(plan.steps.len(), 2);
        assert_eq!(plan.unchanged, 1);
        assert_eq!(plan.steps[0].target, "2.jpg");
        assert_eq!(plan.steps[1].target, "3.jpg");
        assert!(plan.steps.iter().all(|s| s.status == StepStatus::Planned));
    }

    #[test]
    fn test_build_preserves_order_and_paths() {
        let rule = NamingRule::Replace(ReplaceRule::new("", true, "a", "b").unwrap());
        let entries = vec![entry("/d/sub/a1.txt", 0), entry("/d/a2.txt", 0)];

        let plan = build_plan(&entries, &rule, "path");

        assert_eq!(plan.steps[0].target_path(), PathBuf::from("/d/sub/b1.txt"));
        assert_eq!(plan.steps[1].target_path(), PathBuf::from("/d/b2.txt"));
        assert_eq!(plan.steps[0].source_name(), "a1.txt");
    }

    #[test]
    fn test_case_only_change_is_kept() {
        let rule = NamingRule::Replace(ReplaceRule::new("", true, "photo", "Photo").unwrap());
        let plan = build_plan(&[entry("/d/photo.png", 0)], &rule, "path");
        assert_eq!(plan.steps.len(), 1);
        assert_eq!(plan.steps[0].target, "Photo.png");
    }

    #[test]
    fn test_plan_id_shape() {
        let rule = NamingRule::Sequence(SequenceRule::new(1, 2, "p", "", true).unwrap());
        let plan = build_plan(&[], &rule, "name");
        assert_eq!(plan.id.len(), 16);
        assert!(plan.id.chars().all(|c| c.is_ascii_hexdigit()));
        assert!(plan.is_empty());
    }

    #[test]
    fn test_plan_file_location() {
        assert_eq!(
            plan_file(Path::new("/w/.batchren"), "0123abcd"),
            PathBuf::from("/w/.batchren/plans/0123abcd.json")
        );
    }

    #[test]
    fn test_write_plan_round_trips_json() {
        let dir = tempfile::TempDir::new().unwrap();
        let rule = NamingRule::Replace(ReplaceRule::new("", true, "a", "b").unwrap());
        let plan = build_plan(&[entry("/d/a.txt", 0)], &rule, "path");
        let out = dir.path().join("nested").join("plan.json");

        write_plan(&plan, &out).unwrap();

        let loaded = read_plan(&out).unwrap();
        assert_eq!(loaded.id, plan.id);
        assert_eq!(loaded.steps[0].target, "b.txt");
        // The compiled matcher is rebuilt on demand after loading
        assert_eq!(
            loaded.rule.propose(&entry("/d/a.txt", 0), 0),
            Some("b.txt".to_string())
        );
    }
}
