//! Form helpers available while rendering a widget

use crate::error::TrellisResult;
use crate::form::proxy::FormBuilderProxy;
use crate::form::{BuilderClass, FormObject, Options};
use crate::widget::RenderContext;
use html_escape::encode_double_quoted_attribute;
use std::rc::Rc;
use tracing::debug;

/// Options for [`form_for`]
#[derive(Debug, Clone, Default)]
pub struct FormForOptions {
    /// Wrap this builder instead of the context's default
    pub builder: Option<BuilderClass>,
    /// Form action
    pub url: Option<String>,
    /// HTTP method (default: post)
    pub method: Option<String>,
    /// Passed through to the builder
    pub options: Options,
}

/// Render a form for `object`
///
/// Field helpers called on the proxy inside `block` write straight into the
/// context's buffer between the opening and closing form tags.
pub fn form_for<F>(
    ctx: &mut RenderContext,
    object_name: &str,
    object: Option<Rc<FormObject>>,
    options: FormForOptions,
    block: F,
) -> TrellisResult<()>
where
    F: FnOnce(&mut FormBuilderProxy) -> TrellisResult<()>,
{
    let class = ctx.form_class().wrapping(options.builder);
    debug!(
        "form_for {} using {}",
        object_name,
        class.parent_builder_class().name()
    );

    let action = options.url.unwrap_or_default();
    let method = options.method.unwrap_or_else(|| "post".to_string());
    ctx.raw(&format!(
        r#"<form action="{}" method="{}" accept-charset="UTF-8">"#,
        encode_double_quoted_attribute(&action),
        encode_double_quoted_attribute(&method)
    ));

    let mut proxy = class.build(object_name, object, ctx.output().clone(), options.options);
    block(&mut proxy)?;

    ctx.raw("</form>");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn fields_land_inside_form_tags() {
        let mut ctx = RenderContext::new();
        let user = Rc::new(FormObject::new().with("email", "a@example.com"));
        let options = FormForOptions {
            url: Some("/users".to_string()),
            ..FormForOptions::default()
        };

        form_for(&mut ctx, "user", Some(user), options, |f| {
            f.invoke("text_field", &[Value::sym("email")])?;
            f.invoke("submit", &[])?;
            Ok(())
        })
        .unwrap();

        assert_eq!(
            ctx.output().contents(),
            concat!(
                r#"<form action="/users" method="post" accept-charset="UTF-8">"#,
                r#"<input type="text" name="user[email]" id="user_email" value="a@example.com"/>"#,
                r#"<input type="submit" name="commit" value="Save"/>"#,
                "</form>"
            )
        );
    }

    #[test]
    fn block_errors_propagate() {
        let mut ctx = RenderContext::new();
        let result = form_for(&mut ctx, "user", None, FormForOptions::default(), |f| {
            f.invoke("no_such_helper", &[])?;
            Ok(())
        });
        assert!(result.is_err());
    }
}
