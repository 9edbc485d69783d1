#![no_main]

use batchren_core::{
    bounded_temp_name, build_plan, check_name, parse_temp_name, resolve, ExistingNames, NamingRule, RenameStep,
    SequenceRule,
};
use libfuzzer_sys::fuzz_target;
use std::collections::HashSet;
use std::path::Path;

fuzz_target!(|data: &[u8]| {
    let input = String::from_utf8_lossy(data);
    let mut lines = input.lines().take(40);

    // First line: existing bystanders separated by '|'
    let Some(header) = lines.next() else {
        return;
    };
    let bystanders: Vec<String> = header
        .split('|')
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .collect();

    let dir = Path::new("/fuzz");
    let rule = NamingRule::Sequence(SequenceRule::new(1, 0, "", "", true).unwrap());
    let mut plan = build_plan(&[], &rule, "fuzz");
    for (index, candidate) in lines.enumerate() {
        let candidate: String = candidate.chars().take(64).collect();
        if candidate.is_empty() || candidate.contains('/') {
            continue;
        }
        let _ = check_name(&candidate);
        let _ = parse_temp_name(&candidate);
        let staged = bounded_temp_name(&plan.id, index, 0, &candidate, 48);
        assert!(staged.len() <= 48, "temporary name {} over budget", staged);
        if let Some(original) = parse_temp_name(&staged) {
            assert_eq!(original, candidate);
        }
        plan.steps
            .push(RenameStep::new(dir.join(format!("src{}", index)), candidate));
    }

    let sources: HashSet<String> = plan.steps.iter().map(RenameStep::source_name).collect();
    let mut existing = ExistingNames::new();
    existing.insert(dir, bystanders.iter().chain(sources.iter()).cloned());

    let plan = resolve(plan, &existing, false);

    let mut seen = HashSet::new();
    for step in &plan.steps {
        assert!(seen.insert(step.target.clone()), "duplicate target {}", step.target);
        if !sources.contains(&step.target) {
            assert!(!bystanders.contains(&step.target), "bystander {}", step.target);
        }
    }
});
