#![allow(
    clippy::expect_used,
    reason = "graph error tests use expect for descriptive failures"
)]

//! Fatal resolution errors and the final unresolved-item check.

use miette::Diagnostic;
use musubi::graph::{Graph, GraphError};
use musubi::item::{ItemType, OutputType};
use musubi::location::Location;
use rstest::{fixture, rstest};
use test_support::graph::{default_toolchain, file, label, toolchain_item, toolchain_without};
use test_support::{RecordingLoader, TargetBuilder};

#[fixture]
fn graph() -> Graph<RecordingLoader> {
    Graph::new(RecordingLoader::new())
}

fn code(err: &GraphError) -> String {
    err.code().map(|c| c.to_string()).unwrap_or_default()
}

#[rstest]
#[case::executable(OutputType::Executable, "link")]
#[case::shared(OutputType::SharedLibrary, "solink")]
#[case::copy(OutputType::Copy, "copy")]
#[case::group(OutputType::Group, "stamp")]
fn targets_need_their_tool(
    mut graph: Graph<RecordingLoader>,
    #[case] output_type: OutputType,
    #[case] tool: &str,
) {
    graph
        .define_item(toolchain_without(&default_toolchain(), &[tool]))
        .expect("toolchain");
    let err = graph
        .define_item(TargetBuilder::new("//app", output_type).build())
        .expect_err("tool is missing");
    let GraphError::MissingTool {
        target,
        toolchain,
        tool: missing,
        ..
    } = &err
    else {
        panic!("expected a missing tool error, got {err:?}");
    };
    assert_eq!(*target, label("//app"));
    assert_eq!(*toolchain, default_toolchain());
    assert_eq!(missing, tool);
    assert_eq!(code(&err), "musubi::graph::missing_tool");
}

#[rstest]
fn missing_tool_surfaces_when_the_toolchain_arrives_last(mut graph: Graph<RecordingLoader>) {
    graph
        .define_item(TargetBuilder::new("//app", OutputType::Executable).build())
        .expect("app waits");
    let err = graph
        .define_item(toolchain_without(&default_toolchain(), &["link"]))
        .expect_err("cascade reaches app");
    assert!(matches!(err, GraphError::MissingTool { .. }));
}

#[rstest]
#[case::private(TargetBuilder::new("//app", OutputType::Executable).deps(&["//testlib"]))]
#[case::public(TargetBuilder::new("//app", OutputType::Executable).public_deps(&["//testlib"]))]
#[case::data(TargetBuilder::new("//app", OutputType::Executable).data_deps(&["//testlib"]))]
fn production_targets_may_not_depend_on_testonly_ones(
    mut graph: Graph<RecordingLoader>,
    #[case] app: TargetBuilder,
) {
    graph
        .define_item(toolchain_item(&default_toolchain()))
        .expect("toolchain");
    graph
        .define_item(
            TargetBuilder::new("//testlib", OutputType::StaticLibrary)
                .testonly()
                .build(),
        )
        .expect("testlib");
    let err = graph.define_item(app.build()).expect_err("testonly dep");
    assert!(matches!(
        err,
        GraphError::TestonlyDependency { ref dependency, .. } if *dependency == label("//testlib")
    ));
}

#[rstest]
fn testonly_targets_may_depend_on_testonly_ones(mut graph: Graph<RecordingLoader>) {
    graph
        .define_item(toolchain_item(&default_toolchain()))
        .expect("toolchain");
    graph
        .define_item(
            TargetBuilder::new("//testlib", OutputType::StaticLibrary)
                .testonly()
                .build(),
        )
        .expect("testlib");
    graph
        .define_item(
            TargetBuilder::new("//tests", OutputType::Executable)
                .testonly()
                .deps(&["//testlib"])
                .build(),
        )
        .expect("tests");
    graph.check_for_bad_items().expect("all resolved");
}

#[rstest]
fn undefined_deps_are_reported_as_sorted_pairs(mut graph: Graph<RecordingLoader>) {
    graph
        .define_item(toolchain_item(&default_toolchain()))
        .expect("toolchain");
    graph
        .define_item(
            TargetBuilder::new("//b", OutputType::Group)
                .deps(&["//missing2"])
                .build(),
        )
        .expect("b");
    graph
        .define_item(
            TargetBuilder::new("//a", OutputType::Group)
                .deps(&["//missing1", "//b"])
                .build(),
        )
        .expect("a");
    let err = graph.check_for_bad_items().expect_err("missing deps");
    let GraphError::UnresolvedDependencies { missing } = &err else {
        panic!("expected unresolved dependencies, got {err:?}");
    };
    assert_eq!(
        *missing,
        vec![
            (label("//a"), label("//missing1")),
            (label("//b"), label("//missing2")),
        ]
    );
    assert!(err.to_string().contains("//missing1"));
}

#[rstest]
fn mutual_dependencies_are_reported_as_a_cycle(mut graph: Graph<RecordingLoader>) {
    graph
        .define_item(toolchain_item(&default_toolchain()))
        .expect("toolchain");
    for (name, dep) in [("//b", "//c"), ("//c", "//a"), ("//a", "//b")] {
        graph
            .define_item(TargetBuilder::new(name, OutputType::Group).deps(&[dep]).build())
            .expect("cycle member");
    }
    let err = graph.check_for_bad_items().expect_err("cycle");
    let GraphError::DependencyCycle { cycle } = &err else {
        panic!("expected a cycle, got {err:?}");
    };
    assert_eq!(
        *cycle,
        vec![label("//a"), label("//b"), label("//c"), label("//a")]
    );
    assert_eq!(code(&err), "musubi::graph::dependency_cycle");
}

#[rstest]
fn marked_but_unreferenced_records_are_unresolved_items(mut graph: Graph<RecordingLoader>) {
    let orphan = label("//orphan");
    graph
        .get_or_create_record(
            &orphan,
            ItemType::Target,
            &Location::new(file("//BUILD.gn"), 1, 1),
        )
        .expect("record");
    graph.mark_should_generate(&orphan, false);
    let err = graph.check_for_bad_items().expect_err("orphan never defined");
    assert_eq!(err, GraphError::UnresolvedItems { labels: vec![orphan] });
}

#[rstest]
fn unmarked_unresolved_records_are_not_errors(mut graph: Graph<RecordingLoader>) {
    let at = Location::new(file("//BUILD.gn"), 1, 1);
    graph
        .get_or_create_record(&label("//unused"), ItemType::Target, &at)
        .expect("record");
    graph.check_for_bad_items().expect("nothing marked");
}
