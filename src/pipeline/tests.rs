use crate::error::{Error, ErrorKind};
use crate::models::constants::PRE_PROCESSED;
use crate::models::process::{ProcessDefinition, ProcessParameter};

use super::{NextStep, StageGraph};

fn graph(stages: &[&[&str]]) -> StageGraph {
    StageGraph::configure(&ProcessDefinition::with_stages("hydro", "1.0", stages))
        .expect("valid layout")
}

fn sub(name: &str) -> NextStep {
    NextStep::SubProcess(name.to_string())
}

fn layout_problems(err: Error) -> Vec<String> {
    match err {
        Error::StageLayout { problems } => problems,
        other => panic!("expected a stage layout error, got {other:?}"),
    }
}

#[test]
fn test_configure_assigns_global_order() {
    let g = graph(&[&["LIS"], &["RRR", "RAPID"]]);
    assert_eq!(g.stage_count(), 2);
    assert_eq!(g.sub_process_count(), 3);

    let rapid = g.position("RAPID").unwrap();
    assert_eq!(rapid.stage_index, 2);
    assert_eq!(rapid.step, 1);
    assert_eq!(rapid.order, 3);
    assert_eq!(g.position("LIS").unwrap().order, 1);
}

#[test]
fn test_configure_missing_stages_count() {
    let mut def = ProcessDefinition::with_stages("p", "1", &[&["A"]]);
    def.additional_parameters
        .parameters
        .retain(|p| p.name != "stagesCount");
    let err = StageGraph::configure(&def).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert!(err.to_string().contains("stagesCount"));
}

#[test]
fn test_configure_unparseable_stages_count() {
    let mut def = ProcessDefinition::with_stages("p", "1", &[&["A"]]);
    def.additional_parameters.parameters[0].value = vec!["two".to_string()];
    assert!(StageGraph::configure(&def).is_err());

    def.additional_parameters.parameters[0].value = vec!["0".to_string()];
    assert!(StageGraph::configure(&def).is_err());
}

#[test]
fn test_configure_aggregates_all_problems() {
    let mut def = ProcessDefinition::with_stages("p", "1", &[&["A", "B"], &["C"], &["B"]]);
    def.additional_parameters.parameters[0].value = vec!["4".to_string()];
    // stage002Names emptied
    def.additional_parameters.parameters[2].value.clear();

    let problems = layout_problems(StageGraph::configure(&def).unwrap_err());
    assert_eq!(problems.len(), 3, "{problems:?}");
    assert!(problems.iter().any(|p| p == "empty list for stage002Names"));
    assert!(problems
        .iter()
        .any(|p| p == "missing key-value pair: stage004Names"));
    assert!(problems
        .iter()
        .any(|p| p == "duplicate sub_process_name: B in stage003Names"));
}

#[test]
fn test_configure_rejects_sentinel_names() {
    let def = ProcessDefinition::with_stages("p", "1", &[&["PRE_PROCESSED"], &["FINISHED"]]);
    let problems = layout_problems(StageGraph::configure(&def).unwrap_err());
    assert_eq!(problems.len(), 2);
}

#[test]
fn test_configure_rejects_more_than_one_hundred_sub_processes() {
    let names: Vec<String> = (0..101).map(|i| format!("S{i}")).collect();
    let def = ProcessDefinition {
        additional_parameters: crate::models::process::AdditionalParameters {
            parameters: vec![
                ProcessParameter {
                    name: "stagesCount".to_string(),
                    value: vec!["1".to_string()],
                },
                ProcessParameter {
                    name: "stage001Names".to_string(),
                    value: names,
                },
            ],
        },
        ..ProcessDefinition::with_stages("p", "1", &[&["A"]])
    };
    let problems = layout_problems(StageGraph::configure(&def).unwrap_err());
    assert!(problems[0].contains("101 sub-processes"));
}

#[test]
fn test_configure_rejects_huge_stages_count() {
    for count in [usize::MAX.to_string(), "1000000000".to_string(), "101".to_string()] {
        let mut def = ProcessDefinition::with_stages("p", "1", &[&["A"]]);
        for param in def.additional_parameters.parameters.iter_mut() {
            if param.name == "stagesCount" {
                param.value = vec![count.clone()];
            }
        }
        let problems = layout_problems(StageGraph::configure(&def).unwrap_err());
        assert_eq!(problems.len(), 1);
        assert!(problems[0].contains("at most 100"), "{count}: {problems:?}");
    }
}

#[test]
fn test_from_groups_validates() {
    assert!(StageGraph::from_groups(vec![]).is_err());
    assert!(StageGraph::from_groups(vec![vec!["A".to_string()], vec![]]).is_err());
    let g = StageGraph::from_groups(vec![vec!["A".to_string(), "B".to_string()]]).unwrap();
    assert_eq!(g.sub_process_count(), 2);
}

#[test]
fn test_progress_range_three_sub_processes() {
    let g = graph(&[&["LIS"], &["RRR", "RAPID"]]);
    assert_eq!(g.progress_range("LIS").unwrap(), (1, 33));
    assert_eq!(g.progress_range("RRR").unwrap(), (34, 66));
    // Truncated: 100 is not a multiple of 3
    assert_eq!(g.progress_range("RAPID").unwrap(), (67, 99));
}

#[test]
fn test_progress_range_single_sub_process() {
    let g = graph(&[&["ONLY"]]);
    assert_eq!(g.progress_range("ONLY").unwrap(), (1, 100));
}

#[test]
fn test_progress_range_unknown_name() {
    let g = graph(&[&["LIS"]]);
    let err = g.progress_range("RRR").unwrap_err();
    assert!(matches!(err, Error::UnknownSubProcess { .. }));
    assert!(g.progress_range(PRE_PROCESSED).is_err());
}

#[test]
fn test_progress_ranges_partition_for_all_sizes() {
    for total in 1..=100usize {
        let names: Vec<String> = (0..total).map(|i| format!("S{i}")).collect();
        let g = StageGraph::from_groups(vec![names.clone()]).unwrap();
        let width = (100 / total) as u32;

        let mut previous_end = 0;
        for (idx, name) in names.iter().enumerate() {
            let (start, end) = g.progress_range(name).unwrap();
            assert_eq!(start, previous_end + 1, "total={total} idx={idx}");
            assert!(start <= end);
            assert_eq!(end, width * (idx as u32 + 1));
            previous_end = end;
        }
        assert!(previous_end <= 100);
    }
}

#[test]
fn test_next_from_entry_picks_first_enabled_group() {
    let g = graph(&[&["LIS"], &["RRR", "RAPID"], &["POWER"]]);
    assert_eq!(g.next(PRE_PROCESSED, &[true, true, true]).unwrap(), sub("LIS"));
    assert_eq!(g.next(PRE_PROCESSED, &[false, true, true]).unwrap(), sub("RRR"));
    assert_eq!(g.next(PRE_PROCESSED, &[false, false, true]).unwrap(), sub("POWER"));
    assert_eq!(
        g.next(PRE_PROCESSED, &[false, false, false]).unwrap(),
        NextStep::Finished
    );
}

#[test]
fn test_next_stays_within_entered_group_regardless_of_flag() {
    let g = graph(&[&["LIS"], &["RRR", "RAPID"], &["POWER"]]);
    assert_eq!(g.next("RRR", &[true, false, true]).unwrap(), sub("RAPID"));
}

#[test]
fn test_next_skips_disabled_groups() {
    let g = graph(&[&["LIS"], &["RRR", "RAPID"], &["POWER"]]);
    assert_eq!(g.next("LIS", &[true, false, true]).unwrap(), sub("POWER"));
    assert_eq!(g.next("LIS", &[true, true, false]).unwrap(), sub("RRR"));
    assert_eq!(g.next("LIS", &[true, false, false]).unwrap(), NextStep::Finished);
}

#[test]
fn test_next_after_last_sub_process_is_finished() {
    let g = graph(&[&["LIS"], &["RRR", "RAPID"]]);
    assert_eq!(g.next("RAPID", &[true, true]).unwrap(), NextStep::Finished);
    assert_eq!(NextStep::Finished.as_str(), "FINISHED");
}

#[test]
fn test_next_rejects_flag_count_mismatch() {
    let g = graph(&[&["LIS"], &["RRR", "RAPID"]]);
    // One flag per sub-process is wrong: flags are per stage-group
    let err = g.next("LIS", &[true, true, true]).unwrap_err();
    assert!(matches!(
        err,
        Error::StageFlagMismatch {
            expected: 2,
            actual: 3
        }
    ));
    assert!(g.next(PRE_PROCESSED, &[]).is_err());
}

#[test]
fn test_next_rejects_unknown_current() {
    let g = graph(&[&["LIS"]]);
    let err = g.next("NOPE", &[true]).unwrap_err();
    assert!(err.to_string().contains("NOPE"));
}
