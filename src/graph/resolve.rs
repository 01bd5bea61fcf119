//! Per-type resolution hooks.
//!
//! A record resolves once all its blocking deps have. At that point every
//! item it references is defined and resolved, so the hooks below read their
//! deps straight from the record map and compute whatever is derived from
//! them.

use std::collections::BTreeMap;

use indexmap::IndexSet;

use super::error::GraphError;
use super::record::Record;
use crate::item::{Config, ConfigValues, Item, ItemKind, ResolvedTarget, Target};
use crate::label::Label;

/// Values computed by a resolution hook.
pub(crate) enum Resolution {
    Target(ResolvedTarget),
    Config(ConfigValues),
    Toolchain,
    Pool,
}

pub(crate) fn resolve_item(
    records: &BTreeMap<Label, Record>,
    item: &Item,
) -> Result<Resolution, GraphError> {
    match item.kind() {
        ItemKind::Target(target) => resolve_target(records, item, target).map(Resolution::Target),
        ItemKind::Config(config) => Ok(Resolution::Config(resolve_config(records, config))),
        ItemKind::Toolchain(_) => Ok(Resolution::Toolchain),
        ItemKind::Pool(_) => Ok(Resolution::Pool),
    }
}

/// Store the computed values on the item.
pub(crate) fn apply(item: &mut Item, resolution: Resolution) {
    match (item.kind_mut(), resolution) {
        (ItemKind::Target(target), Resolution::Target(resolved)) => {
            target.resolved = Some(resolved);
        }
        (ItemKind::Config(config), Resolution::Config(values)) => {
            config.resolved = Some(values);
        }
        _ => {}
    }
}

fn lookup<'a>(records: &'a BTreeMap<Label, Record>, label: &Label) -> Option<&'a Item> {
    records.get(label).and_then(Record::item)
}

fn resolve_target(
    records: &BTreeMap<Label, Record>,
    item: &Item,
    target: &Target,
) -> Result<ResolvedTarget, GraphError> {
    let tool = target.output_type.required_tool();
    let has_tool = lookup(records, &target.toolchain)
        .and_then(Item::as_toolchain)
        .is_some_and(|toolchain| toolchain.tool(tool).is_some());
    if !has_tool {
        return Err(GraphError::MissingTool {
            target: item.label().clone(),
            toolchain: target.toolchain.clone(),
            tool: tool.to_owned(),
            location: item.location().clone(),
        });
    }

    if !target.testonly {
        let testonly_dep = target.all_deps().find(|dep| {
            lookup(records, dep)
                .and_then(Item::as_target)
                .is_some_and(|dep| dep.testonly)
        });
        if let Some(dep) = testonly_dep {
            return Err(GraphError::TestonlyDependency {
                target: item.label().clone(),
                dependency: dep.clone(),
                location: item.location().clone(),
            });
        }
    }

    let mut configs: IndexSet<Label> = target
        .configs
        .iter()
        .chain(&target.public_configs)
        .chain(&target.all_dependent_configs)
        .cloned()
        .collect();
    let mut all_dependent: IndexSet<Label> =
        target.all_dependent_configs.iter().cloned().collect();
    let mut public: IndexSet<Label> = target.public_configs.iter().cloned().collect();

    let inherited: Vec<(&Label, &ResolvedTarget)> = target
        .linked_deps()
        .filter_map(|dep| {
            lookup(records, dep)
                .and_then(Item::as_target)
                .and_then(Target::resolved)
                .map(|resolved| (dep, resolved))
        })
        .collect();

    for (_, dep) in &inherited {
        all_dependent.extend(dep.all_dependent_configs.iter().cloned());
    }
    configs.extend(all_dependent.iter().cloned());
    for (label, dep) in &inherited {
        configs.extend(dep.public_configs.iter().cloned());
        if target.public_deps.contains(*label) {
            public.extend(dep.public_configs.iter().cloned());
        }
    }

    Ok(ResolvedTarget {
        configs: configs.into_iter().collect(),
        all_dependent_configs: all_dependent.into_iter().collect(),
        public_configs: public.into_iter().collect(),
        tool: tool.to_owned(),
    })
}

fn resolve_config(records: &BTreeMap<Label, Record>, config: &Config) -> ConfigValues {
    let mut values = config.values.clone();
    for nested in &config.configs {
        if let Some(nested) = lookup(records, nested)
            .and_then(Item::as_config)
            .and_then(Config::resolved)
        {
            values.append(nested);
        }
    }
    values
}
