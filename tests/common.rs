use futures::channel::oneshot;
use graphql_engine::{ResolverError, ResolverResult, Resolved};
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::task::{Context, Poll};

pub fn ok(value: Value) -> ResolverResult {
    Ok(Resolved::Value(value))
}

pub fn fail(message: &str) -> ResolverResult {
    Err(ResolverError::new(message))
}

/// Pending once, then ready.
pub struct YieldNow(bool);

impl Future for YieldNow {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.0 {
            return Poll::Ready(());
        }

        self.0 = true;
        cx.waker().wake_by_ref();
        Poll::Pending
    }
}

pub fn yield_now() -> YieldNow {
    YieldNow(false)
}

/// Records the order in which resolvers start and finish.
#[derive(Default)]
pub struct Journal(Mutex<Vec<String>>);

impl Journal {
    pub fn push(&self, entry: String) -> usize {
        let mut entries = self.0.lock().unwrap();
        entries.push(entry);
        entries.len()
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

/// Lets the first list item wait on the last one.
pub struct Gate {
    sender: Mutex<Option<oneshot::Sender<()>>>,
    receiver: Mutex<Option<oneshot::Receiver<()>>>,
    pub completed: Mutex<Vec<i64>>,
}

impl Gate {
    pub fn new() -> Self {
        let (sender, receiver) = oneshot::channel();

        Gate {
            sender: Mutex::new(Some(sender)),
            receiver: Mutex::new(Some(receiver)),
            completed: Mutex::new(vec![]),
        }
    }

    pub async fn wait(&self) -> Result<(), ResolverError> {
        let receiver = self.receiver.lock().unwrap().take();

        match receiver {
            Some(receiver) => receiver.await.map_err(|e| ResolverError::new(e.to_string())),
            None => Ok(()),
        }
    }

    pub fn open(&self) {
        if let Some(sender) = self.sender.lock().unwrap().take() {
            let _ = sender.send(());
        }
    }
}

pub mod pets {
    use graphql_engine::{
        resolver_fn, Field, InputValue, InterfaceType, ObjectType, Resolved, ResolverContext,
        ResolverError, Schema, TypeRef, UnionType,
    };
    use serde_json::{json, Value};
    use std::sync::Arc;

    use super::{ok, Gate};

    pub struct Viewer(pub String);

    lazy_static::lazy_static! {
        pub static ref SCHEMA: Schema = Schema::new("Query")
            .register(
                ObjectType::new("Query")
                    .field(
                        Field::new("pets", TypeRef::non_null(TypeRef::list(TypeRef::named_non_null("Pet"))))
                            .resolver(resolver_fn(|_: ResolverContext| async {
                                ok(json!([
                                    { "__typename": "Dog", "name": "Rex", "barkVolume": 3 },
                                    { "__typename": "Cat", "name": "Tom", "meowVolume": 5, "lives": 9 },
                                ]))
                            })),
                    )
                    .field(
                        Field::new("search", TypeRef::list(TypeRef::named("SearchResult")))
                            .resolver(resolver_fn(|_: ResolverContext| async {
                                ok(json!([
                                    { "kind": "Cat", "name": "Tom", "lives": 9 },
                                    { "kind": "Bird", "name": "Tweety" },
                                ]))
                            })),
                    )
                    .field(
                        Field::new("greet", TypeRef::named("String"))
                            .argument(InputValue::new("name", TypeRef::named("String")).default_value(json!("world")))
                            .argument(InputValue::new("times", TypeRef::named("Int")))
                            .resolver(resolver_fn(|ctx: ResolverContext| async move {
                                let name = ctx.argument("name").and_then(Value::as_str).unwrap_or_default();
                                let times = ctx.argument("times").and_then(Value::as_u64).unwrap_or(1) as usize;

                                ok(json!(vec![format!("Hello, {}", name); times].join(" ")))
                            })),
                    )
                    .field(
                        Field::new("viewer", TypeRef::named("String"))
                            .resolver(resolver_fn(|ctx: ResolverContext| async move {
                                let viewer = ctx.data::<Viewer>().ok_or("Not signed in.")?;

                                ok(json!(viewer.0))
                            })),
                    )
                    .field(
                        Field::new("panics", TypeRef::named("String"))
                            .resolver(resolver_fn(|_: ResolverContext| async {
                                if true {
                                    panic!("kaboom");
                                }

                                ok(Value::Null)
                            })),
                    )
                    .field(
                        Field::new("partial", TypeRef::list(TypeRef::named("Int")))
                            .resolver(resolver_fn(|_: ResolverContext| async {
                                Ok::<_, ResolverError>(Resolved::Partial {
                                    data: json!([1, null, 3]),
                                    errors: vec![ResolverError::new("Second item is gone.").with_path(vec![1.into()])],
                                })
                            })),
                    )
                    .field(
                        Field::new("later", TypeRef::named("String"))
                            .resolver(resolver_fn(|_: ResolverContext| async {
                                Ok::<_, ResolverError>(Resolved::deferred(async { ok(json!("later")) }))
                            })),
                    )
                    .field(
                        Field::new("items", TypeRef::list(TypeRef::named("Item")))
                            .resolver(resolver_fn(|_: ResolverContext| async {
                                ok(json!([{ "index": 0 }, { "index": 1 }, { "index": 2 }]))
                            })),
                    ),
            )
            .register(
                InterfaceType::new("Pet")
                    .field(Field::new("name", TypeRef::named_non_null("String"))),
            )
            .register(
                ObjectType::new("Dog")
                    .implements("Pet")
                    .field(Field::new("name", TypeRef::named_non_null("String")))
                    .field(Field::new("barkVolume", TypeRef::named("Int"))),
            )
            .register(
                ObjectType::new("Cat")
                    .implements("Pet")
                    .field(Field::new("name", TypeRef::named_non_null("String")))
                    .field(Field::new("meowVolume", TypeRef::named("Int")))
                    .field(Field::new("lives", TypeRef::named("Int"))),
            )
            .register(
                UnionType::new("SearchResult")
                    .member("Dog")
                    .member("Cat")
                    .type_resolver(|value: &Value| value.get("kind").and_then(Value::as_str).map(str::to_owned)),
            )
            .register(
                ObjectType::new("Item").field(
                    Field::new("value", TypeRef::named("String"))
                        .resolver(resolver_fn(|ctx: ResolverContext| async move {
                            let gate = ctx.data::<Arc<Gate>>().ok_or("Missing gate.")?;
                            let index = ctx.source["index"].as_i64().unwrap_or_default();

                            match index {
                                0 => gate.wait().await?,
                                2 => gate.open(),
                                _ => {}
                            }

                            gate.completed.lock().unwrap().push(index);
                            ok(json!(format!("item {}", index)))
                        })),
                ),
            );
    }
}

pub mod nulls {
    use graphql_engine::{resolver_fn, Field, ObjectType, ResolverContext, Schema, TypeRef};

    use super::fail;

    lazy_static::lazy_static! {
        pub static ref SCHEMA: Schema = Schema::new("Query")
            .register(
                ObjectType::new("Query")
                    .field(Field::new("nonNullA", TypeRef::named_non_null("A")))
                    .field(Field::new("nullableA", TypeRef::named("A")))
                    .field(Field::new("list", TypeRef::list(TypeRef::named_non_null("A"))))
                    .field(Field::new("sibling", TypeRef::named("String")))
                    .field(
                        Field::new("failing", TypeRef::named_non_null("String"))
                            .resolver(resolver_fn(|_: ResolverContext| async { fail("boom") })),
                    ),
            )
            .register(
                ObjectType::new("A")
                    .field(Field::new("b", TypeRef::named_non_null("String")))
                    .field(Field::new("c", TypeRef::named("String"))),
            );
    }
}

pub mod journal {
    use graphql_engine::{resolver_fn, Field, ObjectType, ResolverContext, Schema, TypeRef};
    use serde_json::json;
    use std::sync::Arc;

    use super::{fail, ok, yield_now, Journal};

    fn logged(name: &'static str) -> Field {
        Field::new(name, TypeRef::named("Int")).resolver(resolver_fn(move |ctx: ResolverContext| async move {
            let journal = ctx.data::<Arc<Journal>>().ok_or("Missing journal.")?;

            journal.push(format!("start {}", name));
            yield_now().await;
            let len = journal.push(format!("end {}", name));

            ok(json!(len))
        }))
    }

    lazy_static::lazy_static! {
        pub static ref SCHEMA: Schema = Schema::new("Query")
            .mutation("Mutation")
            .register(ObjectType::new("Query").field(logged("first")).field(logged("second")))
            .register(
                ObjectType::new("Mutation")
                    .field(logged("first"))
                    .field(logged("second"))
                    .field(
                        Field::new("failing", TypeRef::named("Int"))
                            .resolver(resolver_fn(|_: ResolverContext| async { fail("Nope.") })),
                    ),
            );

        pub static ref QUERY_ONLY: Schema = Schema::new("Query")
            .register(ObjectType::new("Query").field(logged("first")));
    }
}

pub mod nodes {
    use graphql_engine::{
        resolver_fn, Field, InputValue, InterfaceType, ObjectType, ResolverContext, Schema, TypeRef,
    };
    use serde_json::{json, Value};

    use super::ok;

    lazy_static::lazy_static! {
        pub static ref SCHEMA: Schema = Schema::new("Query")
            .register(
                ObjectType::new("Query").field(
                    Field::new("node", TypeRef::named("Node"))
                        .argument(InputValue::new("id", TypeRef::named_non_null("ID")))
                        .resolver(resolver_fn(|ctx: ResolverContext| async move {
                            match ctx.argument("id").and_then(Value::as_str) {
                                Some("dog") => ok(json!({ "__typename": "Dog", "id": "dog", "bark": "woof" })),
                                Some("cat") => ok(json!({ "__typename": "Cat", "id": "cat", "meow": "purr" })),
                                _ => ok(Value::Null),
                            }
                        })),
                ),
            )
            .register(InterfaceType::new("Node").field(Field::new("id", TypeRef::named_non_null("ID"))))
            .register(
                ObjectType::new("Dog")
                    .implements("Node")
                    .field(Field::new("id", TypeRef::named_non_null("ID")))
                    .field(Field::new("bark", TypeRef::named("String"))),
            )
            .register(
                ObjectType::new("Cat")
                    .implements("Node")
                    .field(Field::new("id", TypeRef::named_non_null("ID")))
                    .field(Field::new("meow", TypeRef::named("String"))),
            );
    }
}
