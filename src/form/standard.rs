//! Default parent builder
//!
//! Produces minimal field markup and nested builders. Every markup-producing
//! operation returns [`Outcome::Emitted`] and leaves writing to the caller.

use crate::error::{TrellisError, TrellisResult};
use crate::form::{BuilderClass, FieldsBlock, FormArgs, FormBuilder, FormObject, Options, Outcome};
use crate::value::Value;
use crate::widget::OutputBuffer;
use html_escape::{encode_double_quoted_attribute as attr, encode_text};
use std::rc::Rc;

/// Operations understood by [`StandardFormBuilder`]
pub const STANDARD_OPERATIONS: &[&str] = &[
    "check_box",
    "fields_for",
    "hidden_field",
    "index",
    "label",
    "multipart",
    "password_field",
    "submit",
    "text_area",
    "text_field",
];

/// Builder for a single object's fields
pub struct StandardFormBuilder {
    object_name: String,
    object: Option<Rc<FormObject>>,
    template: OutputBuffer,
    options: Options,
}

impl StandardFormBuilder {
    pub fn new(args: FormArgs) -> Self {
        Self {
            object_name: args.object_name,
            object: args.object,
            template: args.template,
            options: args.options,
        }
    }

    /// The class used to construct this builder by name
    pub fn class() -> BuilderClass {
        BuilderClass::new("StandardFormBuilder", Self::construct)
    }

    fn construct(args: FormArgs) -> Box<dyn FormBuilder> {
        Box::new(Self::new(args))
    }

    pub fn object_name(&self) -> &str {
        &self.object_name
    }

    fn field_name(&self, method: &str) -> String {
        format!("{}[{}]", self.object_name, method)
    }

    fn field_id(&self, method: &str) -> String {
        let base: String = self
            .object_name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        let base = base.trim_matches('_').replace("__", "_");
        format!("{}_{}", base, method)
    }

    fn value_of(&self, method: &str) -> Value {
        self.object
            .as_ref()
            .and_then(|o| o.get(method).cloned())
            .unwrap_or_default()
    }

    fn input(&self, kind: &str, method: &str, value: Option<String>) -> String {
        let mut markup = format!(
            r#"<input type="{}" name="{}" id="{}""#,
            kind,
            attr(&self.field_name(method)),
            attr(&self.field_id(method)),
        );
        if let Some(value) = value {
            markup.push_str(&format!(r#" value="{}""#, attr(&value)));
        }
        markup.push_str("/>");
        markup
    }

    fn current_value(&self, method: &str) -> Option<String> {
        match self.value_of(method) {
            Value::Nil => None,
            value => Some(value.to_string()),
        }
    }

    fn nested(&self, name: &str) -> StandardFormBuilder {
        StandardFormBuilder {
            object_name: self.field_name(name),
            object: self.object.as_ref().and_then(|o| o.child(name)),
            template: self.template.clone(),
            options: Options::new(),
        }
    }
}

fn humanize(method: &str) -> String {
    let spaced = method.trim_end_matches("_id").replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn text_arg<'a>(operation: &str, args: &'a [Value], index: usize) -> TrellisResult<&'a str> {
    match args.get(index) {
        Some(value) => value.as_str().ok_or_else(|| {
            TrellisError::invalid_args(operation, format!("argument {} must be a name", index))
        }),
        None => Err(TrellisError::invalid_args(
            operation,
            format!("expected at least {} argument(s)", index + 1),
        )),
    }
}

fn optional_text(args: &[Value], index: usize) -> Option<String> {
    args.get(index).filter(|v| !v.is_nil()).map(Value::to_string)
}

impl FormBuilder for StandardFormBuilder {
    fn builder_name(&self) -> &str {
        "StandardFormBuilder"
    }

    fn responds_to(&self, operation: &str) -> bool {
        STANDARD_OPERATIONS.contains(&operation)
    }

    fn call(
        &mut self,
        operation: &str,
        args: &[Value],
        block: Option<FieldsBlock<'_>>,
    ) -> TrellisResult<Outcome> {
        let outcome = match operation {
            "label" => {
                let method = text_arg(operation, args, 0)?;
                let text = optional_text(args, 1).unwrap_or_else(|| humanize(method));
                Outcome::Emitted(format!(
                    r#"<label for="{}">{}</label>"#,
                    attr(&self.field_id(method)),
                    encode_text(&text)
                ))
            }
            "text_field" | "hidden_field" => {
                let method = text_arg(operation, args, 0)?;
                let kind = operation.trim_end_matches("_field");
                Outcome::Emitted(self.input(kind, method, self.current_value(method)))
            }
            "password_field" => {
                let method = text_arg(operation, args, 0)?;
                Outcome::Emitted(self.input("password", method, None))
            }
            "text_area" => {
                let method = text_arg(operation, args, 0)?;
                Outcome::Emitted(format!(
                    r#"<textarea name="{}" id="{}">{}</textarea>"#,
                    attr(&self.field_name(method)),
                    attr(&self.field_id(method)),
                    encode_text(&self.current_value(method).unwrap_or_default())
                ))
            }
            "check_box" => {
                let method = text_arg(operation, args, 0)?;
                let checked = matches!(self.value_of(method), Value::Bool(true) | Value::Int(1));
                let mut markup = format!(
                    r#"<input type="hidden" name="{}" value="0"/>"#,
                    attr(&self.field_name(method))
                );
                let mut checkbox = self.input("checkbox", method, Some("1".to_string()));
                if checked {
                    checkbox.insert_str(checkbox.len() - 2, r#" checked="checked""#);
                }
                markup.push_str(&checkbox);
                Outcome::Emitted(markup)
            }
            "submit" => {
                let label = optional_text(args, 0).unwrap_or_else(|| "Save".to_string());
                Outcome::Emitted(format!(
                    r#"<input type="submit" name="commit" value="{}"/>"#,
                    attr(&label)
                ))
            }
            "fields_for" => {
                let name = text_arg(operation, args, 0)?;
                let mut nested = self.nested(name);
                match block {
                    Some(block) => {
                        block(&mut nested)?;
                        Outcome::Value(Value::Nil)
                    }
                    None => Outcome::Builder(Box::new(nested)),
                }
            }
            "index" => Outcome::Value(self.options.get("index").cloned().unwrap_or_default()),
            "multipart" => Outcome::Value(Value::Bool(matches!(
                self.options.get("multipart"),
                Some(Value::Bool(true))
            ))),
            _ => {
                return Err(TrellisError::UnsupportedOperation {
                    operation: operation.to_string(),
                    builder: self.builder_name().to_string(),
                })
            }
        };
        Ok(outcome)
    }
}
