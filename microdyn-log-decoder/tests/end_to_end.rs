// End-to-end decoding of small synthetic trace logs
use microdyn_log_decoder::{
    ActionKind, IndeterminatePolicy, LogParser, Outcome, ParserConfig, ParserError, Phase,
    Strategy,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Build a trace log with the given design variables/dependencies, runtime
/// dependencies and timed entries (seconds after start, entry XML)
fn trace_log(design: &str, runtime: &str, entries: &[(u32, &str)]) -> String {
    let mut timed = String::new();
    for (secs, body) in entries {
        timed.push_str(&format!(
            r#"    <logEntry xsi:type="cbaloggingmodel:LogEntryTimeStamp" timeStamp="2017-06-21T10:{:02}:{:02}.000+0200">
      {}
    </logEntry>
"#,
            secs / 60,
            secs % 60,
            body
        ));
    }

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<cbaloggingmodel:LogModel xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xmlns:cbaloggingmodel="http://cba/logging">
  <tracesOverview>
    <logEntry xsi:type="cbaloggingmodel:SessionLogEntry">
      <logEntry xsi:type="cbaloggingmodel:TaskLogEntry" user="S042" entryPoint="Handball" test="CPS2017">
        <designMicrodynModel>
{design}
        </designMicrodynModel>
      </logEntry>
    </logEntry>
    <logEntry xsi:type="cbaloggingmodel:SessionLogEntry"/>
    <logEntry xsi:type="cbaloggingmodel:LogEntryTimeStamp" timeStamp="2017-06-21T10:00:00.000+0200">
      <logEntry xsi:type="cbaloggingmodel:ButtonLogEntry" id="Start"/>
    </logEntry>
{timed}    <logEntry xsi:type="cbaloggingmodel:SessionLogEntry">
      <logEntry xsi:type="cbaloggingmodel:ResultLogEntry">
        <runtimeMicrodynModel>
{runtime}
        </runtimeMicrodynModel>
      </logEntry>
    </logEntry>
  </tracesOverview>
  <microdynOverview explorationTime="45" controlTime="30"/>
</cbaloggingmodel:LogModel>"#
    )
}

const TWO_INPUT_DESIGN: &str = r#"
          <variable id="A" userDefinedId="ExoA" addend="0"/>
          <variable id="X" userDefinedId="ExoB" addend="0"/>
          <variable id="B" userDefinedId="EndoA" addend="0" targetValue="3" targetLimit="7"/>
          <dependency sourceId="A" targetId="B" factor="0.5"/>
          <dependency sourceId="B" targetId="B" factor="1"/>"#;

fn apply(phase: &str, values: &[(&str, i64)]) -> String {
    let variables: String = values
        .iter()
        .map(|(name, value)| format!(r#"<variable userDefinedId="{}" value="{}"/>"#, name, value))
        .collect();
    format!(
        r#"<logEntry xsi:type="cbaloggingmodel:MicroDynButtonPressLogEntry" phase="{}" button="Execute">{}</logEntry>"#,
        phase, variables
    )
}

#[test]
fn scenario_votat_exploration_and_correct_control() {
    init_logging();
    let exploration = apply("exploration", &[("ExoA", 5), ("ExoB", 0), ("EndoA", 12)]);
    let control = apply("control", &[("ExoA", 1), ("ExoB", 1), ("EndoA", 6)]);
    let xml = trace_log(
        TWO_INPUT_DESIGN,
        r#"<dependency sourceId="A" targetId="B"/>"#,
        &[(2, exploration.as_str()), (50, control.as_str())],
    );

    let parsed = LogParser::default().parse_str(&xml).unwrap();

    assert_eq!(parsed.properties.subject, "S042");
    assert_eq!(parsed.properties.item, "Handball");
    assert_eq!(parsed.properties.test, "CPS2017");

    let applies: Vec<_> = parsed
        .actions
        .iter()
        .filter(|a| a.kind == ActionKind::PressApply)
        .collect();
    assert_eq!(applies.len(), 2);
    assert_eq!(applies[0].strategy, Some(Strategy::Votat));
    assert_eq!(applies[0].elapsed_secs, 2.0);
    assert_eq!(applies[0].round, Some(1));
    assert_eq!(applies[1].strategy, Some(Strategy::Ca));
    assert_eq!(applies[1].phase, Some(Phase::Control));

    assert_eq!(parsed.correctness.exploration, Outcome::Correct);
    assert_eq!(parsed.correctness.control.overall, Outcome::Correct);
    assert_eq!(parsed.correctness.control.variables[0].value, Some(6));

    assert_eq!(parsed.aggregates.len(), 2);
    let exploration_row = &parsed.aggregates[0];
    assert_eq!(exploration_row.phase, Phase::Exploration);
    assert_eq!(exploration_row.votat_freq, 1);
    assert_eq!(exploration_row.rounds, 1);
    assert_eq!(exploration_row.correct, Outcome::Correct);
    assert_eq!(exploration_row.num_dependencies, 1);
    assert_eq!(exploration_row.num_inputs, 2);
    assert_eq!(exploration_row.num_outputs, 1);
    assert!(!exploration_row.eigendynamic);
    assert_eq!(exploration_row.phase_duration, 45.0);
    assert_eq!(exploration_row.votat_x_vars, 1);
    assert!(!exploration_row.full_votat);
    assert_eq!(exploration_row.strategy_sequence, "VOTAT");
    assert_eq!(exploration_row.action_sequence, "PressApply-EndExploration");

    let control_row = &parsed.aggregates[1];
    assert_eq!(control_row.phase, Phase::Control);
    assert_eq!(control_row.correct, Outcome::Correct);
    assert_eq!(control_row.rounds, 1);
    assert_eq!(control_row.ca_freq, 1);
    assert_eq!(control_row.phase_duration, 30.0);
}

#[test]
fn scenario_strategies_by_snapshot() {
    let design = r#"
          <variable id="A" userDefinedId="ExoA" addend="0"/>
          <variable id="B" userDefinedId="ExoB" addend="0"/>
          <variable id="C" userDefinedId="ExoC" addend="0"/>
          <variable id="Y" userDefinedId="EndoA" addend="0" targetValue="0" targetLimit="100"/>"#;
    let entries = [
        apply("exploration", &[("ExoA", 0), ("ExoB", 2), ("ExoC", 5), ("EndoA", 1)]),
        apply("exploration", &[("ExoA", 0), ("ExoB", 0), ("ExoC", 5), ("EndoA", 2)]),
        apply("exploration", &[("ExoA", 0), ("ExoB", 0), ("ExoC", 0), ("EndoA", 2)]),
        apply("exploration", &[("ExoA", 1), ("ExoB", 1), ("ExoC", 1), ("EndoA", 3)]),
    ];
    let timed: Vec<(u32, &str)> = entries
        .iter()
        .enumerate()
        .map(|(i, body)| (i as u32 + 1, body.as_str()))
        .collect();
    let xml = trace_log(design, "", &timed);

    let parsed = LogParser::default().parse_str(&xml).unwrap();
    let strategies: Vec<_> = parsed
        .actions
        .iter()
        .filter(|a| a.kind == ActionKind::PressApply)
        .map(|a| a.strategy)
        .collect();
    assert_eq!(
        strategies,
        vec![
            Some(Strategy::Hotat),
            Some(Strategy::Votat),
            Some(Strategy::Notat),
            Some(Strategy::Ca),
        ]
    );

    let row = &parsed.aggregates[0];
    assert_eq!(row.strategy_sequence, "HOTAT-VOTAT-NOTAT-CA");
    assert_eq!(row.rounds, 4);
    // No dependencies in the design and none drawn
    assert_eq!(row.correct, Outcome::Correct);
    assert_eq!(parsed.aggregates.len(), 1, "no control records");
}

#[test]
fn scenario_full_votat_and_eigendynamic() {
    let design = r#"
          <variable id="A" userDefinedId="ExoA" addend="0"/>
          <variable id="B" userDefinedId="ExoB" addend="0"/>
          <variable id="Y" userDefinedId="EndoA" addend="0.1" targetValue="10" targetLimit="0"/>
          <dependency sourceId="A" targetId="Y" factor="2"/>"#;
    let first = apply("exploration", &[("ExoA", 3), ("ExoB", 0), ("EndoA", 3)]);
    let second = apply("exploration", &[("ExoA", 0), ("ExoB", -1), ("EndoA", 3)]);
    let add = r#"<logEntry xsi:type="cbaloggingmodel:MicroDynAddDependencyLogEntry" phase="exploration" id="arrow1" sourceId="A" destinationId="Y"/>"#;
    let remove = r#"<logEntry xsi:type="cbaloggingmodel:MicroDynRemoveDependencyLogEntry" phase="exploration" id="arrow1" sourceId="A" destinationId="Y"/>"#;
    let xml = trace_log(
        design,
        r#"<dependency sourceId="Y" targetId="Y"/><dependency sourceId="A" targetId="Y"/><dependency sourceId="A" targetId="Y"/>"#,
        &[(1, first.as_str()), (2, add), (3, remove), (4, second.as_str())],
    );

    let parsed = LogParser::default().parse_str(&xml).unwrap();
    let row = &parsed.aggregates[0];
    assert!(row.eigendynamic);
    assert_eq!(row.num_dependencies, 2);
    assert!(row.full_votat);
    assert_eq!(row.votat_x_vars, 2);
    assert_eq!(row.correct, Outcome::Correct);
    assert_eq!(
        row.action_sequence,
        "PressApply-AddDependency-RemoveDependency-PressApply-EndExploration"
    );

    let deltas: Vec<String> = parsed
        .actions
        .iter()
        .filter_map(|a| a.dependency.as_ref().map(|d| d.to_string()))
        .collect();
    assert_eq!(deltas, vec!["A->Y", "A->Y"]);
}

#[test]
fn scenario_missing_output_value_follows_policy() {
    init_logging();
    let exploration = apply("exploration", &[("ExoA", 5), ("ExoB", 0)]);
    let xml = trace_log(TWO_INPUT_DESIGN, "", &[(2, exploration.as_str())]);

    let failing = LogParser::default().parse_str(&xml).unwrap();
    assert_eq!(failing.correctness.control.variables[0].outcome, Outcome::Indeterminate);
    assert_eq!(failing.correctness.control.overall, Outcome::Incorrect);

    let propagating = LogParser::new(
        ParserConfig::new().with_indeterminate_policy(IndeterminatePolicy::Propagate),
    )
    .parse_str(&xml)
    .unwrap();
    assert_eq!(propagating.correctness.control.overall, Outcome::Indeterminate);
    // Exploration is wrong: ground truth A->B was not drawn
    assert_eq!(propagating.correctness.exploration, Outcome::Incorrect);
}

#[test]
fn phase_records_keep_traversal_order() {
    let entries: Vec<String> = (0..6)
        .map(|i| apply("exploration", &[("ExoA", i), ("ExoB", 0), ("EndoA", i)]))
        .collect();
    let timed: Vec<(u32, &str)> = entries
        .iter()
        .enumerate()
        .map(|(i, body)| (i as u32 * 7 + 1, body.as_str()))
        .collect();
    let xml = trace_log(TWO_INPUT_DESIGN, "", &timed);
    let parsed = LogParser::default().parse_str(&xml).unwrap();

    let traversal: Vec<_> = parsed
        .actions
        .iter()
        .filter(|a| a.phase == Some(Phase::Exploration))
        .collect();
    let mut sorted = traversal.clone();
    sorted.sort_by(|a, b| a.elapsed_secs.total_cmp(&b.elapsed_secs));
    assert_eq!(traversal, sorted);

    let rounds: Vec<u32> = traversal.iter().filter_map(|a| a.round).collect();
    assert_eq!(rounds, vec![1, 2, 3, 4, 5, 6]);
}

#[test]
fn rerun_is_identical() {
    let exploration = apply("exploration", &[("ExoA", 5), ("ExoB", 0), ("EndoA", 4)]);
    let xml = trace_log(TWO_INPUT_DESIGN, "", &[(2, exploration.as_str())]);
    let parser = LogParser::default();

    let first = parser.parse_str(&xml).unwrap();
    let second = parser.parse_str(&xml).unwrap();
    assert_eq!(first.aggregates, second.aggregates);
    assert_eq!(first.actions, second.actions);
}

#[test]
fn malformed_files_fail_as_a_whole() {
    init_logging();
    let xml = trace_log(
        r#"<variable id="A" userDefinedId="ExoA" addend="zero"/>"#,
        "",
        &[],
    );
    assert!(matches!(
        LogParser::default().parse_str(&xml),
        Err(ParserError::ValueFormat { .. })
    ));

    let huge_exploration_time = trace_log(TWO_INPUT_DESIGN, "", &[])
        .replace(r#"explorationTime="45""#, r#"explorationTime="1e300""#);
    assert!(matches!(
        LogParser::default().parse_str(&huge_exploration_time),
        Err(ParserError::ValueFormat { .. })
    ));

    let without_user = trace_log(TWO_INPUT_DESIGN, "", &[]).replace("user=\"S042\"", "");
    assert!(matches!(
        LogParser::default().parse_str(&without_user),
        Err(ParserError::MalformedLog(_))
    ));
}
