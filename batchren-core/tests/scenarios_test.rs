use batchren_core::{
    build_plan, execute_plan, existing_names_for, resolve, scan_directory, sort_entries,
    validate_plan, ConflictKind, Entry, MemoryAudit, NameLimits, NamingRule, NullAudit, Outcome,
    RenameStep, ReplaceRule, SequenceRule, SortKey, StdFs, StepStatus,
};
use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

fn at(secs: u64) -> SystemTime {
    SystemTime::UNIX_EPOCH + Duration::from_secs(secs)
}

#[test]
fn test_realcugan_suffix_removal_with_occupied_target() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("sakura_01.realcugan.png"), "upscaled").unwrap();
    fs::write(temp.path().join("sakura_01.png"), "unrelated").unwrap();

    let entries = scan_directory(temp.path(), Some("png"), false).unwrap();
    let entries: Vec<Entry> = entries
        .into_iter()
        .filter(|e| e.name.contains("realcugan"))
        .collect();
    let rule = NamingRule::Replace(ReplaceRule::new("", true, ".realcugan", "").unwrap());

    let plan = build_plan(&entries, &rule, "path");
    assert_eq!(plan.steps[0].candidate, "sakura_01.png");

    let existing = existing_names_for(&entries).unwrap();
    let mut plan = resolve(plan, &existing, false);
    validate_plan(&mut plan, &NameLimits::default()).unwrap();

    assert_eq!(plan.steps[0].target, "sakura_01_1.png");
    assert_eq!(plan.steps[0].conflict, Some(ConflictKind::External));

    let mut audit = MemoryAudit::new();
    let result = execute_plan(&mut plan, false, &mut StdFs, &mut audit);

    assert_eq!(result.outcome, Outcome::Applied);
    assert_eq!(result.auto_suffixed.len(), 1);
    assert_eq!(result.auto_suffixed[0].candidate, "sakura_01.png");
    assert_eq!(
        fs::read_to_string(temp.path().join("sakura_01_1.png")).unwrap(),
        "upscaled"
    );
    assert_eq!(
        fs::read_to_string(temp.path().join("sakura_01.png")).unwrap(),
        "unrelated"
    );
    assert!(audit.contains("sakura_01_1.png"));
}

#[test]
fn test_sequence_in_modification_time_order() {
    let temp = TempDir::new().unwrap();
    let files = [("late.dat", 300), ("early.dat", 100), ("middle.dat", 200)];
    let mut entries = Vec::new();
    for (name, mtime) in files {
        let path = temp.path().join(name);
        fs::write(&path, name).unwrap();
        entries.push(Entry::new(path, 1, at(mtime)));
    }

    let entries = sort_entries(entries, SortKey::Mtime, false);
    let rule = NamingRule::Sequence(SequenceRule::new(1, 3, "img_", ".jpg", false).unwrap());
    let plan = build_plan(&entries, &rule, "mtime");
    let mut plan = resolve(plan, &existing_names_for(&entries).unwrap(), false);
    validate_plan(&mut plan, &NameLimits::default()).unwrap();

    let targets: Vec<_> = plan.steps.iter().map(|s| s.target.as_str()).collect();
    assert_eq!(targets, vec!["img_001.jpg", "img_002.jpg", "img_003.jpg"]);

    let result = execute_plan(&mut plan, false, &mut StdFs, &mut NullAudit);
    assert_eq!(result.count(StepStatus::Committed), 3);
    for (name, content) in [
        ("img_001.jpg", "early.dat"),
        ("img_002.jpg", "middle.dat"),
        ("img_003.jpg", "late.dat"),
    ] {
        assert_eq!(fs::read_to_string(temp.path().join(name)).unwrap(), content);
    }
}

#[test]
fn test_sequence_reverse_order() {
    let entries = vec![
        Entry::new("/d/a.png", 10, at(1)),
        Entry::new("/d/b.png", 30, at(2)),
        Entry::new("/d/c.png", 20, at(3)),
    ];
    let sorted = sort_entries(entries, SortKey::Size, true);
    let rule = NamingRule::Sequence(SequenceRule::new(1, 2, "", "", true).unwrap());
    let plan = build_plan(&sorted, &rule, "size");

    let pairs: Vec<_> = plan
        .steps
        .iter()
        .map(|s| (s.source_name(), s.candidate.clone()))
        .collect();
    assert_eq!(
        pairs,
        vec![
            ("b.png".to_string(), "01.png".to_string()),
            ("c.png".to_string(), "02.png".to_string()),
            ("a.png".to_string(), "03.png".to_string()),
        ]
    );
}

#[test]
fn test_duplicate_candidates_in_batch_are_suffixed_in_order() {
    let temp = TempDir::new().unwrap();
    for name in ["x.v1.txt", "x.v2.txt", "x.v3.txt"] {
        fs::write(temp.path().join(name), name).unwrap();
    }
    let entries = batchren_core::sort_by_path(scan_directory(temp.path(), None, false).unwrap());

    // Every file wants "x.txt"
    let rule = NamingRule::Sequence(SequenceRule::new(1, 0, "", "", true).unwrap());
    let mut plan = build_plan(&[], &rule, "path");
    plan.steps = entries
        .iter()
        .map(|e| RenameStep::new(e.path.clone(), "x.txt".to_string()))
        .collect();
    let mut plan = resolve(plan, &existing_names_for(&entries).unwrap(), false);
    validate_plan(&mut plan, &NameLimits::default()).unwrap();

    let targets: Vec<_> = plan.steps.iter().map(|s| s.target.as_str()).collect();
    assert_eq!(targets, vec!["x.txt", "x_1.txt", "x_2.txt"]);
    assert_eq!(plan.steps[1].conflict, Some(ConflictKind::Internal));

    let result = execute_plan(&mut plan, false, &mut StdFs, &mut NullAudit);
    assert_eq!(result.outcome, Outcome::Applied);
    assert_eq!(
        fs::read_to_string(temp.path().join("x.txt")).unwrap(),
        "x.v1.txt"
    );
    assert_eq!(
        fs::read_to_string(temp.path().join("x_2.txt")).unwrap(),
        "x.v3.txt"
    );
}

#[test]
fn test_plan_serializes_to_json() {
    let temp = TempDir::new().unwrap();
    let rule = NamingRule::Sequence(SequenceRule::new(1, 3, "img_", "", true).unwrap());
    let entries = vec![Entry::new("/d/a.png", 1, at(1))];
    let plan = build_plan(&entries, &rule, "mtime");

    let path = temp.path().join("plans").join("plan.json");
    batchren_core::write_plan(&plan, &path).unwrap();
    let json = fs::read_to_string(Path::new(&path)).unwrap();
    assert!(json.contains("\"mode\": \"sequence\""));
    assert!(json.contains("img_001.png"));
}
