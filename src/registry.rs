use std::collections::BTreeMap;

use crate::error::{DrawError, DrawResult};
use crate::style::{Attributes, StyleParameters, UnknownField};

#[derive(Clone, Debug, Default)]
pub struct StyleRegistry {
    styles: BTreeMap<String, StyleParameters>,
    current: Option<String>,
    override_active: bool,
}

#[must_use = "pass the scope back to exit_override to restore the previous style"]
#[derive(Debug)]
pub struct OverrideScope {
    activated: bool,
    previous: Option<String>,
}

impl StyleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: &str, attributes: &Attributes) -> Vec<UnknownField> {
        let (style, unknown) = StyleParameters::new(name, attributes);
        self.styles.insert(name.to_string(), style);
        unknown
    }

    pub fn update(&mut self, name: &str, attributes: &Attributes) -> Option<Vec<UnknownField>> {
        match self.styles.get_mut(name) {
            Some(style) => Some(style.update(attributes)),
            None => {
                log::warn!(target: "style", "style {name} not found");
                None
            }
        }
    }

    pub fn update_current(&mut self, attributes: &Attributes) -> Option<Vec<UnknownField>> {
        let Some(name) = self.current.clone() else {
            log::warn!(target: "style", "no current style to update");
            return None;
        };
        self.update(&name, attributes)
    }

    pub fn select(&mut self, name: &str) -> bool {
        if self.styles.contains_key(name) {
            self.current = Some(name.to_string());
            true
        } else {
            log::warn!(target: "style", "style {name} not found");
            false
        }
    }

    pub fn current_name(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn active(&self) -> DrawResult<&StyleParameters> {
        let name = self.current.as_deref().ok_or(DrawError::NoActiveStyle)?;
        self.styles
            .get(name)
            .ok_or_else(|| DrawError::StyleNotFound(name.to_string()))
    }

    pub fn get(&self, name: &str) -> Option<&StyleParameters> {
        self.styles.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.styles.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &StyleParameters)> {
        self.styles.iter().map(|(name, style)| (name.as_str(), style))
    }

    pub fn is_override_active(&self) -> bool {
        self.override_active
    }

    /// Inside an already active override this switches nothing, so operations that call other
    /// operations keep the caller's style.
    pub fn enter_override(&mut self, name: Option<&str>) -> DrawResult<OverrideScope> {
        if self.override_active {
            return Ok(OverrideScope {
                activated: false,
                previous: None,
            });
        }
        if let Some(name) = name {
            if !self.styles.contains_key(name) {
                return Err(DrawError::StyleNotFound(name.to_string()));
            }
        }
        let previous = self.current.clone();
        if let Some(name) = name {
            self.current = Some(name.to_string());
        }
        self.override_active = true;
        Ok(OverrideScope {
            activated: true,
            previous,
        })
    }

    pub fn exit_override(&mut self, scope: OverrideScope) {
        if scope.activated {
            self.current = scope.previous;
            self.override_active = false;
        }
    }
}
