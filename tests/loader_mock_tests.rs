#![allow(
    clippy::expect_used,
    reason = "loader tests use expect for descriptive failures"
)]

//! What the graph asks of its loader, checked with a mock.

use mockall::{mock, predicate::eq};
use musubi::graph::Graph;
use musubi::item::OutputType;
use musubi::label::Label;
use musubi::loader::Loader;
use musubi::location::Location;
use test_support::TargetBuilder;
use test_support::graph::{default_toolchain, label, toolchain_item};

mock! {
    pub Evaluator {}
    impl Loader for Evaluator {
        fn load(&mut self, label: &Label, origin: &Location);
        fn toolchain_loaded(&mut self, toolchain: &Label);
        fn default_toolchain(&self) -> Label;
    }
}

fn evaluator() -> MockEvaluator {
    let mut loader = MockEvaluator::new();
    loader
        .expect_default_toolchain()
        .returning(default_toolchain);
    loader
}

#[test]
fn undefined_deps_are_requested_from_the_referencing_site() {
    let mut loader = evaluator();
    loader
        .expect_load()
        .withf(|target, origin| {
            *target == label("//lib") && origin.file.as_str() == "//app/BUILD.gn"
        })
        .times(1..)
        .return_const(());
    loader
        .expect_load()
        .withf(|target, _| *target == default_toolchain())
        .times(1..)
        .return_const(());

    let mut graph = Graph::new(loader);
    graph
        .define_item(
            TargetBuilder::new("//app", OutputType::Executable)
                .deps(&["//lib"])
                .build(),
        )
        .expect("define app");
    graph.loader_mut().checkpoint();
}

#[test]
fn defining_a_toolchain_reports_it_once() {
    let mut loader = evaluator();
    loader
        .expect_toolchain_loaded()
        .with(eq(default_toolchain()))
        .times(1)
        .return_const(());
    loader.expect_load().never();

    let mut graph = Graph::new(loader);
    graph
        .define_item(toolchain_item(&default_toolchain()))
        .expect("define toolchain");
}

#[test]
fn known_deps_are_never_requested() {
    let mut loader = evaluator();
    loader
        .expect_toolchain_loaded()
        .times(1)
        .return_const(());
    loader.expect_load().never();

    let mut graph = Graph::new(loader);
    graph
        .define_item(toolchain_item(&default_toolchain()))
        .expect("toolchain");
    graph
        .define_item(TargetBuilder::new("//lib", OutputType::StaticLibrary).build())
        .expect("lib");
    graph
        .define_item(
            TargetBuilder::new("//app", OutputType::Executable)
                .deps(&["//lib"])
                .build(),
        )
        .expect("app");
    graph.check_for_bad_items().expect("resolved");
}
