//! Integration tests for Trellis

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use tempfile::TempDir;
    use trellis::cache::{CacheKey, CacheOptions, FileStore, FragmentCache};
    use trellis::Value;

    fn trellis() -> Command {
        let mut cmd = cargo_bin_cmd!("trellis");
        cmd.arg("--no-local");
        cmd
    }

    #[test]
    fn help_displays() {
        trellis()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("cacheable widget fragments"));
    }

    #[test]
    fn version_displays() {
        trellis()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("trellis"));
    }

    #[test]
    fn config_path() {
        trellis()
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show_uses_explicit_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("trellis.toml");
        std::fs::write(&path, "[cache]\nnamespace = \"site\"\n").unwrap();

        trellis()
            .arg("--config")
            .arg(&path)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[cache]"))
            .stdout(predicate::str::contains("namespace = \"site\""));
    }

    #[test]
    fn config_invalid_store_fails_with_hint() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("trellis.toml");
        std::fs::write(&path, "[cache]\nstore = \"redis\"\n").unwrap();

        trellis()
            .arg("--config")
            .arg(&path)
            .args(["config", "show"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Hint:"));
    }

    #[test]
    fn config_init_writes_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("config.toml");

        trellis()
            .arg("--config")
            .arg(&path)
            .args(["config", "init"])
            .assert()
            .success();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("[forms]"));
    }

    #[test]
    fn key_skip_digest_drops_nil() {
        trellis()
            .args(["key", "--skip-digest", "a", "nil", "1"])
            .assert()
            .success()
            .stdout(predicate::str::contains("views/a/1"));
    }

    #[test]
    fn key_digest_is_stable() {
        let run = || {
            let output = trellis().args(["key", "posts", "7"]).output().unwrap();
            String::from_utf8(output.stdout).unwrap()
        };
        let first = run();
        assert!(first.contains("views/"));
        assert!(!first.contains("views/posts/7"));
        assert_eq!(first, run());
    }

    #[test]
    fn key_widget_scope_changes_digest() {
        let run = |extra: &[&str]| {
            let output = trellis()
                .arg("key")
                .args(extra)
                .args(["posts", "7"])
                .output()
                .unwrap();
            String::from_utf8(output.stdout).unwrap()
        };
        assert_ne!(run(&[]), run(&["--widget", "Views::Post"]));
        assert_ne!(run(&["--widget", "Views::Card"]), run(&["--widget", "Views::Post"]));
    }

    #[test]
    fn key_requires_parts() {
        trellis().arg("key").assert().failure();
    }

    #[test]
    fn cache_list_empty_dir() {
        let temp = TempDir::new().unwrap();

        trellis()
            .args(["cache", "list", "--dir"])
            .arg(temp.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("No cached fragments found."));
    }

    #[test]
    fn cache_list_and_clear_stored_fragments() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::new(temp.path());
        let key = CacheKey::new([Value::from("sidebar"), Value::from(3)]);
        let options = CacheOptions::verbatim();
        store
            .fetch_or_store(&key, &options, &mut || Ok("<aside/>".to_string()))
            .unwrap();

        trellis()
            .args(["cache", "list", "--format", "plain", "--dir"])
            .arg(temp.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("views/sidebar/3"));

        trellis()
            .args(["cache", "stats", "--dir"])
            .arg(temp.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("Fragments: 1"));

        trellis()
            .args(["cache", "clear", "--yes", "--dir"])
            .arg(temp.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("cleared 1 fragment(s)"));

        trellis()
            .args(["cache", "list", "--dir"])
            .arg(temp.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("No cached fragments found."));
    }
}

mod widget_tests {
    use std::cell::Cell;
    use std::sync::{Arc, LazyLock};
    use trellis::cache::{
        Cacheability, CacheableOptions, FragmentCache, MemoryStore, NullStore,
    };
    use trellis::widget::{render, Assigns, RenderContext, Widget, WidgetType};
    use trellis::{TrellisResult, Value};

    static POST: LazyLock<WidgetType> = LazyLock::new(|| {
        WidgetType::new("Views::Posts::Show")
            .needs(["post", "author"])
            .cacheable(["posts"], CacheableOptions::default())
    });

    static BANNER: LazyLock<WidgetType> =
        LazyLock::new(|| WidgetType::new("Views::Banner").needs(["title"]));

    struct Post {
        assigns: Assigns,
        renders: Cell<u32>,
    }

    impl Post {
        fn new(post: i64, author: Option<&str>) -> Self {
            let assigns = POST
                .assigns([("post", Value::from(post)), ("author", Value::from(author))])
                .unwrap();
            Self {
                assigns,
                renders: Cell::new(0),
            }
        }
    }

    impl Widget for Post {
        fn widget_type(&self) -> &WidgetType {
            &POST
        }

        fn assigns(&self) -> &Assigns {
            &self.assigns
        }

        fn content(&self, ctx: &mut RenderContext) -> TrellisResult<()> {
            self.renders.set(self.renders.get() + 1);
            ctx.raw("<article>");
            ctx.text(self.assigns.read("post"));
            ctx.raw("</article>");
            Ok(())
        }
    }

    static CARD: LazyLock<WidgetType> = LazyLock::new(|| {
        WidgetType::new("Views::Posts::Card")
            .needs(["post", "author"])
            .cacheable(["posts"], CacheableOptions::default())
    });

    struct Card {
        assigns: Assigns,
    }

    impl Widget for Card {
        fn widget_type(&self) -> &WidgetType {
            &CARD
        }

        fn assigns(&self) -> &Assigns {
            &self.assigns
        }

        fn content(&self, ctx: &mut RenderContext) -> TrellisResult<()> {
            ctx.raw("<div class=\"card\">");
            ctx.text(self.assigns.read("author"));
            ctx.raw("</div>");
            Ok(())
        }
    }

    struct Banner {
        assigns: Assigns,
        renders: Cell<u32>,
    }

    impl Widget for Banner {
        fn widget_type(&self) -> &WidgetType {
            &BANNER
        }

        fn assigns(&self) -> &Assigns {
            &self.assigns
        }

        fn content(&self, ctx: &mut RenderContext) -> TrellisResult<()> {
            self.renders.set(self.renders.get() + 1);
            ctx.text(self.assigns.read("title"));
            Ok(())
        }
    }

    #[test]
    fn cache_key_is_deterministic() {
        let a = Post::new(7, Some("ada"));
        let b = Post::new(7, Some("ada"));
        assert_eq!(a.cache_name().unwrap(), b.cache_name().unwrap());
        assert_eq!(a.cache_name().unwrap().to_string(), "posts/7/ada");
    }

    #[test]
    fn nil_assign_is_dropped_from_key() {
        let post = Post::new(7, None);
        let key = post.cache_name().unwrap();
        assert_eq!(key.parts(), &[Value::from("posts"), Value::Int(7)]);
    }

    #[test]
    fn cached_render_short_circuits() {
        let store = Arc::new(MemoryStore::new());
        let post = Post::new(7, Some("ada"));

        let first = render(&post, &mut RenderContext::new().with_cache(store.clone())).unwrap();
        let second = render(&post, &mut RenderContext::new().with_cache(store.clone())).unwrap();

        assert_eq!(first, "<article>7</article>");
        assert_eq!(first, second);
        assert_eq!(post.renders.get(), 1);
        assert_eq!(store.stats().hits(), 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn null_store_always_renders() {
        let store: Arc<dyn FragmentCache> = Arc::new(NullStore::new());
        let post = Post::new(7, Some("ada"));

        for _ in 0..2 {
            render(&post, &mut RenderContext::new().with_cache(store.clone())).unwrap();
        }
        assert_eq!(post.renders.get(), 2);
    }

    #[test]
    fn uncacheable_widget_renders_same_with_or_without_cache() {
        let store = Arc::new(MemoryStore::new());
        let banner = Banner {
            assigns: BANNER.assigns([("title", "Hi & bye")]).unwrap(),
            renders: Cell::new(0),
        };

        let plain = render(&banner, &mut RenderContext::new()).unwrap();
        assert_eq!(banner.renders.get(), 1);

        for round in 2..=3 {
            let cached =
                render(&banner, &mut RenderContext::new().with_cache(store.clone())).unwrap();
            assert_eq!(cached, plain);
            assert_eq!(banner.renders.get(), round);
        }

        assert_eq!(plain, "Hi &amp; bye");
        assert!(!banner.is_cacheable());
        assert!(store.is_empty());
    }

    #[test]
    fn equal_keys_from_different_types_do_not_collide() {
        let store = Arc::new(MemoryStore::new());
        let post = Post::new(7, Some("ada"));
        let card = Card {
            assigns: CARD
                .assigns([("post", Value::from(7)), ("author", Value::from("ada"))])
                .unwrap(),
        };
        assert_eq!(post.cache_name().unwrap(), card.cache_name().unwrap());

        let post_html = render(&post, &mut RenderContext::new().with_cache(store.clone())).unwrap();
        let card_html = render(&card, &mut RenderContext::new().with_cache(store.clone())).unwrap();

        assert_eq!(post_html, "<article>7</article>");
        assert_eq!(card_html, "<div class=\"card\">ada</div>");
        assert_eq!(store.len(), 2);
    }
}

mod form_tests {
    use std::rc::Rc;
    use std::sync::Arc;
    use trellis::form::{
        form_for, BuilderClass, FieldsBlock, FormArgs, FormBuilder, FormForOptions, FormObject,
        Outcome, ProxyClass, StandardFormBuilder,
    };
    use trellis::widget::{OutputBuffer, RenderContext};
    use trellis::{TrellisError, TrellisResult, Value};

    struct Fixed;

    impl FormBuilder for Fixed {
        fn builder_name(&self) -> &str {
            "Fixed"
        }

        fn responds_to(&self, operation: &str) -> bool {
            matches!(operation, "field" | "fields_for")
        }

        fn call(
            &mut self,
            operation: &str,
            _args: &[Value],
            _block: Option<FieldsBlock<'_>>,
        ) -> TrellisResult<Outcome> {
            Ok(Outcome::Emitted(format!("<{}/>", operation)))
        }
    }

    fn fixed(_args: FormArgs) -> Box<dyn FormBuilder> {
        Box::new(Fixed)
    }

    const FIXED: BuilderClass = BuilderClass::new("Fixed", fixed);

    #[test]
    fn string_results_go_to_template() {
        let template = OutputBuffer::new();
        let mut proxy = ProxyClass::new(FIXED).build("user", None, template.clone(), Default::default());

        let returned = proxy.invoke("field", &[Value::sym("name")]).unwrap();

        assert!(returned.is_nil());
        assert_eq!(template.contents(), "<field/>");
    }

    #[test]
    fn renamed_operation_matches_target() {
        let template = OutputBuffer::new();
        let mut proxy = ProxyClass::new(FIXED).build("user", None, template.clone(), Default::default());

        proxy.invoke("simple_fields_for", &[]).unwrap();
        proxy.invoke("fields_for", &[]).unwrap();

        assert_eq!(template.contents(), "<fields_for/><fields_for/>");
    }

    #[test]
    fn unsupported_operation_names_request() {
        let mut proxy =
            ProxyClass::new(FIXED).build("user", None, OutputBuffer::new(), Default::default());

        let err = proxy.invoke("date_select", &[]).unwrap_err();
        assert!(matches!(
            err,
            TrellisError::UnsupportedOperation { ref operation, .. } if operation == "date_select"
        ));
    }

    #[test]
    fn wrapping_identity_and_derivation() {
        let base = ProxyClass::standard();
        assert!(Arc::ptr_eq(&base, &base.wrapping(None)));

        let derived = base.wrapping(Some(FIXED));
        assert!(!Arc::ptr_eq(&base, &derived));
        assert_eq!(derived.parent_builder_class(), FIXED);
        assert!(Arc::ptr_eq(derived.superclass().unwrap(), &base));
        assert_eq!(base.parent_builder_class(), StandardFormBuilder::class());
    }

    #[test]
    fn renamed_operation_returns_same_nested_builder() {
        let address = FormObject::new().with("city", "Oslo");
        let object = Rc::new(FormObject::new().with_child("address", address));
        let template = OutputBuffer::new();
        let mut proxy =
            ProxyClass::standard().build("user", Some(object), template.clone(), Default::default());

        let mut via_alias = proxy
            .invoke("simple_fields_for", &[Value::sym("address")])
            .unwrap()
            .into_builder()
            .unwrap();
        let mut direct = proxy
            .invoke("fields_for", &[Value::sym("address")])
            .unwrap()
            .into_builder()
            .unwrap();

        let outcome = via_alias.call("text_field", &[Value::sym("city")], None).unwrap();
        assert!(matches!(outcome, Outcome::Value(Value::Nil)));
        let first = template.contents();

        direct.call("text_field", &[Value::sym("city")], None).unwrap();
        let second = template.contents()[first.len()..].to_string();

        assert_eq!(first, second);
        assert!(first.contains(r#"name="user[address][city]""#));
        assert!(first.contains(r#"value="Oslo""#));
    }

    #[test]
    fn nested_builder_without_block_emits_into_template() {
        let object = Rc::new(FormObject::new().with_child("address", FormObject::new()));
        let template = OutputBuffer::new();
        let mut proxy =
            ProxyClass::standard().build("user", Some(object), template.clone(), Default::default());

        let mut nested = proxy
            .invoke("fields_for", &[Value::sym("address")])
            .unwrap()
            .into_builder()
            .unwrap();
        assert!(template.is_empty());

        nested.call("text_field", &[Value::sym("city")], None).unwrap();
        assert!(template.contents().starts_with("<input"));
        assert!(template.contents().contains(r#"id="user_address_city""#));
    }

    #[test]
    fn derived_class_builds_overridden_parent() {
        let derived = ProxyClass::standard().wrapping(Some(FIXED));
        let proxy = derived.build("user", None, OutputBuffer::new(), Default::default());
        assert_eq!(proxy.parent().builder_name(), "Fixed");

        let standard = ProxyClass::standard().build("user", None, OutputBuffer::new(), Default::default());
        assert_eq!(standard.parent().builder_name(), "StandardFormBuilder");
    }

    #[test]
    fn form_for_writes_fields_inside_form() {
        let mut ctx = RenderContext::new();
        let user = Rc::new(FormObject::new().with("name", "Ada"));
        let options = FormForOptions {
            url: Some("/users".to_string()),
            ..Default::default()
        };

        form_for(&mut ctx, "user", Some(user), options, |f| {
            f.invoke("text_field", &[Value::sym("name")])?;
            Ok(())
        })
        .unwrap();

        let html = ctx.output().contents();
        assert!(html.starts_with(r#"<form action="/users" method="post""#));
        assert!(html.contains(r#"name="user[name]""#));
        assert!(html.contains(r#"value="Ada""#));
        assert!(html.ends_with("</form>"));
    }
}
