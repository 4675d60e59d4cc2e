//! Shared test utilities used across argot crates.

pub mod tracing {
    //! Recording layer utilities for capturing spans and events in tests.
    use std::collections::HashMap;
    use std::fmt;
    use std::sync::{Arc, Mutex};

    use tracing::field::{Field, Visit};
    use tracing::{Event, Level, Subscriber};
    use tracing_subscriber::Layer;
    use tracing_subscriber::layer::{Context, SubscriberExt};
    use tracing_subscriber::registry::LookupSpan;

    /// Recording layer installed during tests to capture spans and events for
    /// later assertions.
    #[derive(Clone, Default)]
    pub struct RecordingLayer {
        spans: Arc<Mutex<Vec<SpanRecord>>>,
        events: Arc<Mutex<Vec<EventRecord>>>,
    }

    impl RecordingLayer {
        /// Runs `body` with a fresh layer installed as the thread's default
        /// subscriber and returns the layer alongside the body's result.
        ///
        /// # Examples
        /// ```
        /// use argot_test_support::tracing::RecordingLayer;
        ///
        /// let (layer, value) = RecordingLayer::capture(|| {
        ///     tracing::info_span!("sample").in_scope(|| 7)
        /// });
        /// assert_eq!(value, 7);
        /// assert!(layer.span("sample").is_some());
        /// ```
        pub fn capture<T>(body: impl FnOnce() -> T) -> (Self, T) {
            let layer = Self::default();
            let subscriber = tracing_subscriber::registry().with(layer.clone());
            let value = tracing::subscriber::with_default(subscriber, body);
            (layer, value)
        }

        /// Returns a snapshot of the closed spans in completion order.
        #[must_use]
        pub fn spans(&self) -> Vec<SpanRecord> {
            self.spans.lock().expect("lock poisoned").clone()
        }

        /// Returns a snapshot of the emitted events in emission order.
        #[must_use]
        pub fn events(&self) -> Vec<EventRecord> {
            self.events.lock().expect("lock poisoned").clone()
        }

        /// First closed span called `name`.
        #[must_use]
        pub fn span(&self, name: &str) -> Option<SpanRecord> {
            self.spans().into_iter().find(|span| span.name == name)
        }

        /// Names of the closed spans in completion order.
        #[must_use]
        pub fn span_names(&self) -> Vec<String> {
            self.spans().into_iter().map(|span| span.name).collect()
        }

        /// Events whose `message` field equals `message`.
        #[must_use]
        pub fn events_with_message(&self, message: &str) -> Vec<EventRecord> {
            self.events()
                .into_iter()
                .filter(|event| event.field("message") == Some(message))
                .collect()
        }
    }

    /// Snapshot of a closed span with its recorded fields.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct SpanRecord {
        /// Span name captured from the tracing metadata.
        pub name: String,
        /// Structured fields recorded against the span.
        pub fields: HashMap<String, String>,
    }

    impl SpanRecord {
        /// Rendered value of the field called `name`.
        #[must_use]
        pub fn field(&self, name: &str) -> Option<&str> {
            self.fields.get(name).map(String::as_str)
        }
    }

    /// Snapshot of an emitted tracing event.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct EventRecord {
        /// Log level associated with the recorded event.
        pub level: Level,
        /// Event target string extracted from the metadata.
        pub target: String,
        /// Structured fields attached to the event.
        pub fields: HashMap<String, String>,
    }

    impl EventRecord {
        /// Rendered value of the field called `name`.
        #[must_use]
        pub fn field(&self, name: &str) -> Option<&str> {
            self.fields.get(name).map(String::as_str)
        }
    }

    #[derive(Default)]
    struct SpanData {
        name: String,
        fields: HashMap<String, String>,
    }

    impl<S> Layer<S> for RecordingLayer
    where
        S: Subscriber + for<'span> LookupSpan<'span>,
    {
        fn on_new_span(
            &self,
            attrs: &tracing::span::Attributes<'_>,
            id: &tracing::span::Id,
            ctx: Context<'_, S>,
        ) {
            let Some(span) = ctx.span(id) else {
                return;
            };
            let mut data = SpanData {
                name: attrs.metadata().name().to_owned(),
                fields: HashMap::new(),
            };
            attrs.record(&mut FieldRecorder(&mut data.fields));
            span.extensions_mut().insert(data);
        }

        fn on_record(
            &self,
            id: &tracing::span::Id,
            values: &tracing::span::Record<'_>,
            ctx: Context<'_, S>,
        ) {
            let Some(span) = ctx.span(id) else {
                return;
            };
            let mut extensions = span.extensions_mut();
            if let Some(data) = extensions.get_mut::<SpanData>() {
                values.record(&mut FieldRecorder(&mut data.fields));
            }
        }

        fn on_close(&self, id: tracing::span::Id, ctx: Context<'_, S>) {
            let Some(data) = ctx
                .span(&id)
                .and_then(|span| span.extensions_mut().remove::<SpanData>())
            else {
                return;
            };
            self.spans.lock().expect("lock poisoned").push(SpanRecord {
                name: data.name,
                fields: data.fields,
            });
        }

        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            let mut fields = HashMap::new();
            event.record(&mut FieldRecorder(&mut fields));
            self.events.lock().expect("lock poisoned").push(EventRecord {
                level: *event.metadata().level(),
                target: event.metadata().target().to_owned(),
                fields,
            });
        }
    }

    struct FieldRecorder<'a>(&'a mut HashMap<String, String>);

    impl FieldRecorder<'_> {
        fn insert(&mut self, field: &Field, value: impl ToString) {
            self.0.insert(field.name().to_owned(), value.to_string());
        }
    }

    impl Visit for FieldRecorder<'_> {
        fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
            self.insert(field, format!("{value:?}"));
        }

        fn record_str(&mut self, field: &Field, value: &str) {
            self.insert(field, value);
        }

        fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
            self.insert(field, value);
        }

        fn record_bool(&mut self, field: &Field, value: bool) {
            self.insert(field, value);
        }

        fn record_i64(&mut self, field: &Field, value: i64) {
            self.insert(field, value);
        }

        fn record_u64(&mut self, field: &Field, value: u64) {
            self.insert(field, value);
        }
    }
}

pub mod fixtures {
    //! Ready-made dispatch targets shared by integration tests.
    use std::sync::{Arc, Mutex};

    use argot_core::{
        Annotation, BoxError, Container, DispatchError, Function, Role, Scope, Signature, Value,
    };

    /// `greet(name, greeting="Hello")` returning `"{greeting} {name}"`, with
    /// `greeting` exposed as `--greeting`/`-g`.
    ///
    /// # Examples
    /// ```
    /// use argot_core::run;
    /// use argot_test_support::fixtures::greet;
    ///
    /// assert_eq!(run(&greet().into(), ["World"])?, ["Hello World"]);
    /// # Ok::<(), argot_core::DispatchError>(())
    /// ```
    #[must_use]
    pub fn greet() -> Function {
        let signature = Signature::builder()
            .param("name")
            .param_with_default("greeting", "Hello")
            .annotate("name", "who to greet")
            .annotate(
                "greeting",
                Annotation::new("salutation to use")
                    .with_role(Role::Option)
                    .with_abbrev('g'),
            )
            .build()
            .expect("greet signature is valid");
        Function::builder("greet", signature, |args| {
            let greeting = args.text("greeting").unwrap_or("Hello");
            let name = args.text("name").unwrap_or_default();
            Ok(Value::from(format!("{greeting} {name}")))
        })
        .description("Greet someone.")
        .build()
    }

    /// Shared item list mutated by [`inventory`] commands.
    pub type Stock = Arc<Mutex<Vec<String>>>;

    /// Container with `add ITEM` and `remove ITEM` commands operating on the
    /// returned stock. Both commands echo what they did.
    #[must_use]
    pub fn inventory() -> (Container, Stock) {
        let stock: Stock = Arc::default();
        (inventory_builder(&stock).build(), stock)
    }

    /// Same as [`inventory`], with `fallback` answering unmatched tokens.
    #[must_use]
    pub fn inventory_with_fallback<F>(fallback: F) -> (Container, Stock)
    where
        F: Fn(&str) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        let stock: Stock = Arc::default();
        (inventory_builder(&stock).fallback(fallback).build(), stock)
    }

    /// Same as [`inventory`], wrapped in `scope`.
    #[must_use]
    pub fn scoped_inventory(scope: Arc<dyn Scope>) -> (Container, Stock) {
        let stock: Stock = Arc::default();
        (inventory_builder(&stock).scope(scope).build(), stock)
    }

    fn inventory_builder(stock: &Stock) -> argot_core::ContainerBuilder {
        Container::builder("inventory")
            .description("Keep track of items.")
            .command("add", stock_command("add", stock, |items, item| {
                items.push(item.to_owned());
                Ok(format!("added {item}"))
            }))
            .command("remove", stock_command("remove", stock, |items, item| {
                let index = items
                    .iter()
                    .position(|existing| existing == item)
                    .ok_or_else(|| format!("no item `{item}`"))?;
                items.remove(index);
                Ok(format!("removed {item}"))
            }))
    }

    fn stock_command<F>(name: &str, stock: &Stock, apply: F) -> Function
    where
        F: Fn(&mut Vec<String>, &str) -> Result<String, BoxError> + Send + Sync + 'static,
    {
        let signature = Signature::builder()
            .param("item")
            .annotate("item", "item name")
            .build()
            .expect("stock signature is valid");
        let stock = Arc::clone(stock);
        Function::builder(name, signature, move |args| {
            let item = args.text("item").unwrap_or_default();
            let mut items = stock.lock().map_err(|_| "stock lock poisoned")?;
            apply(&mut items, item).map(Value::from)
        })
        .build()
    }

    /// Scope that journals `enter`/`exit` calls, optionally refusing to
    /// open.
    #[derive(Debug, Default)]
    pub struct RecordingScope {
        journal: Mutex<Vec<String>>,
        refuse: bool,
    }

    impl RecordingScope {
        /// A scope whose `enter` always fails.
        #[must_use]
        pub fn refusing() -> Self {
            Self {
                refuse: true,
                ..Self::default()
            }
        }

        /// Recorded calls, e.g. `["enter", "exit:DISPATCH_PARSE"]`.
        #[must_use]
        pub fn journal(&self) -> Vec<String> {
            self.journal.lock().expect("journal lock").clone()
        }
    }

    impl Scope for RecordingScope {
        fn enter(&self) -> Result<(), BoxError> {
            if self.refuse {
                return Err("resource unavailable".into());
            }
            self.journal.lock().expect("journal lock").push("enter".to_owned());
            Ok(())
        }

        fn exit(&self, failure: Option<&DispatchError>) {
            let entry = failure.map_or_else(|| "exit".to_owned(), |err| format!("exit:{}", err.code()));
            self.journal.lock().expect("journal lock").push(entry);
        }
    }
}
