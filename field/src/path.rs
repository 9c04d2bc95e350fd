// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

use std::fmt::Display;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum Step {
    Child(String),
    Index(usize),
    Key(String),
}

/// Path to a field within an object, e.g. `spec.blockDevices[0].ebs`.
///
/// Paths are cheap values: every step returns a new [`Path`] and leaves the parent untouched, so a
/// parent can be shared by the checks of all its children.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Path {
    steps: Vec<Step>,
}

impl Path {
    /// Build a path from its leading field names.
    #[must_use]
    pub fn new(segments: &[&str]) -> Self {
        Self {
            steps: segments
                .iter()
                .map(|s| Step::Child((*s).to_owned()))
                .collect(),
        }
    }

    #[must_use]
    pub fn child(&self, name: &str) -> Self {
        self.with(Step::Child(name.to_owned()))
    }

    /// Address an element of a list field.
    #[must_use]
    pub fn index(&self, index: usize) -> Self {
        self.with(Step::Index(index))
    }

    /// Address an entry of a map field.
    #[must_use]
    pub fn key(&self, key: &str) -> Self {
        self.with(Step::Key(key.to_owned()))
    }

    fn with(&self, step: Step) -> Self {
        let mut steps = self.steps.clone();
        steps.push(step);
        Self { steps }
    }
}

impl Display for Path {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (pos, step) in self.steps.iter().enumerate() {
            match step {
                Step::Child(name) if pos == 0 => write!(f, "{name}")?,
                Step::Child(name) => write!(f, ".{name}")?,
                Step::Index(index) => write!(f, "[{index}]")?,
                Step::Key(key) => write!(f, "[{key}]")?,
            }
        }
        Ok(())
    }
}
