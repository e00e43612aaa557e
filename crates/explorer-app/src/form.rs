//! Form controls and their in-memory values
//!
//! A [`FormState`] is built from a page when it is opened: one [`Control`]
//! per parameter, seeded from the stored snapshot merged over defaults.
//! Edits only touch the in-memory [`FormValueMap`]; it is written back by the
//! submit flow.

use explorer_core::prelude::*;
use explorer_core::{
    Attachment, FormKey, FormValue, FormValueMap, ParameterDescriptor, ParameterKind,
    ParameterSchema,
};

use crate::page::PageSpec;
use crate::persistence::PersistedFormState;

/// Input widget used for a parameter kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKind {
    TextInput,
    NumberInput,
    Toggle,
    FilePicker,
    DataEditor,
    CallbackEditor,
}

impl ControlKind {
    pub fn for_kind(kind: ParameterKind) -> Self {
        match kind {
            ParameterKind::Text => Self::TextInput,
            ParameterKind::Number => Self::NumberInput,
            ParameterKind::Boolean => Self::Toggle,
            ParameterKind::Binary => Self::FilePicker,
            ParameterKind::Structured => Self::DataEditor,
            ParameterKind::CallbackLiteral => Self::CallbackEditor,
        }
    }

    /// Controls whose value is edited as free text
    pub fn accepts_text(&self) -> bool {
        !matches!(self, Self::FilePicker)
    }

    /// Editors that allow line breaks
    pub fn is_multiline(&self) -> bool {
        matches!(self, Self::DataEditor | Self::CallbackEditor)
    }

    pub fn hint(&self) -> &'static str {
        match self {
            Self::TextInput => "text",
            Self::NumberInput => "number",
            Self::Toggle => "space to toggle",
            Self::FilePicker => "path to attach",
            Self::DataEditor => "JSON, or [[name]]",
            Self::CallbackEditor => "return function(...) { ... }",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Control {
    pub name: String,
    pub label: String,
    pub kind: ControlKind,
    pub param_kind: ParameterKind,
    pub description: Option<String>,
}

impl Control {
    fn from_descriptor(descriptor: &ParameterDescriptor) -> Self {
        Self {
            name: descriptor.name.clone(),
            label: descriptor.display_label().to_string(),
            kind: ControlKind::for_kind(descriptor.kind),
            param_kind: descriptor.kind,
            description: descriptor.description.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FormState {
    key: FormKey,
    schema: ParameterSchema,
    controls: Vec<Control>,
    values: FormValueMap,
    dirty: bool,
}

impl FormState {
    /// Build controls for `page`, seeded from the stored snapshot
    pub fn mount(page: &PageSpec, persisted: &PersistedFormState) -> Self {
        let values = persisted.load(&page.key, &page.schema);
        debug!("Mounted form {} with {} controls", page.key, page.schema.len());
        Self::with_values(page, values)
    }

    /// Build controls for `page` with explicit values (missing ones use defaults)
    pub fn with_values(page: &PageSpec, mut values: FormValueMap) -> Self {
        for descriptor in &page.schema {
            values
                .entry(descriptor.name.clone())
                .or_insert_with(|| descriptor.default_value());
        }
        values.retain(|name, _| page.schema.get(name).is_some());

        Self {
            key: page.key.clone(),
            schema: page.schema.clone(),
            controls: page.schema.iter().map(Control::from_descriptor).collect(),
            values,
            dirty: false,
        }
    }

    pub fn key(&self) -> &FormKey {
        &self.key
    }

    pub fn schema(&self) -> &ParameterSchema {
        &self.schema
    }

    pub fn controls(&self) -> &[Control] {
        &self.controls
    }

    pub fn control(&self, name: &str) -> Option<&Control> {
        self.controls.iter().find(|c| c.name == name)
    }

    pub fn values(&self) -> &FormValueMap {
        &self.values
    }

    pub fn value(&self, name: &str) -> Option<&FormValue> {
        self.values.get(name)
    }

    /// Edited since mount, reset or the last submit
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    fn require(&self, name: &str) -> Result<&Control> {
        self.control(name)
            .ok_or_else(|| Error::unknown_parameter(name))
    }

    fn mismatch(control: &Control) -> Error {
        Error::KindMismatch {
            name: control.name.clone(),
            kind: control.param_kind.to_string(),
        }
    }

    fn store(&mut self, name: &str, value: FormValue) {
        self.values.insert(name.to_string(), value);
        self.dirty = true;
    }

    /// Replace a text-edited control's raw text
    pub fn set_text(&mut self, name: &str, text: impl Into<String>) -> Result<()> {
        let control = self.require(name)?;
        if !control.kind.accepts_text() {
            return Err(Self::mismatch(control));
        }
        self.store(name, FormValue::Text(text.into()));
        Ok(())
    }

    /// Flip a toggle and return its new state
    ///
    /// Text held by a toggle (from an older snapshot) counts as `false`
    /// unless it is one of the usual truthy spellings.
    pub fn toggle(&mut self, name: &str) -> Result<bool> {
        let control = self.require(name)?;
        if control.kind != ControlKind::Toggle {
            return Err(Self::mismatch(control));
        }
        let current = match self.values.get(name) {
            Some(FormValue::Bool(b)) => *b,
            Some(FormValue::Text(t)) => {
                matches!(t.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes" | "on")
            }
            _ => false,
        };
        self.store(name, FormValue::Bool(!current));
        Ok(!current)
    }

    /// Append a picked file to a file picker
    pub fn attach(&mut self, name: &str, attachment: Attachment) -> Result<()> {
        let control = self.require(name)?;
        if control.kind != ControlKind::FilePicker {
            return Err(Self::mismatch(control));
        }
        let mut items = match self.values.remove(name) {
            Some(FormValue::Attachments(items)) => items,
            _ => Vec::new(),
        };
        items.push(attachment);
        self.store(name, FormValue::Attachments(items));
        Ok(())
    }

    pub fn clear_attachments(&mut self, name: &str) -> Result<()> {
        let control = self.require(name)?;
        if control.kind != ControlKind::FilePicker {
            return Err(Self::mismatch(control));
        }
        self.store(name, FormValue::Attachments(Vec::new()));
        Ok(())
    }

    /// Replace a value of any kind, as long as the control can hold it
    pub fn set_value(&mut self, name: &str, value: FormValue) -> Result<()> {
        let control = self.require(name)?;
        if !value.fits(control.param_kind) {
            return Err(Self::mismatch(control));
        }
        self.store(name, value);
        Ok(())
    }

    /// Restore schema defaults and delete the stored snapshot
    pub fn reset(&mut self, persisted: &PersistedFormState) -> Result<()> {
        self.values = self.schema.defaults();
        self.dirty = false;
        persisted.clear(&self.key)
    }
}
