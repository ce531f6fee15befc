//! End-to-end tests over the in-memory transport.
use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use kindred::{
    core::{impl_resource, new_object, ObjectMeta, TypeMeta},
    handler_fn, Client, LifecycleDelegate, ResourceExt,
};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Widget {
    #[serde(flatten)]
    types: TypeMeta,
    #[serde(default)]
    metadata: ObjectMeta,
    #[serde(default)]
    spec: serde_json::Value,
}
impl_resource!(Widget, "example.dev", "v1", "Widget", "widgets", "widget", namespaced: true);

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

async fn eventually<F: Fn() -> bool>(what: &str, check: F) {
    for _ in 0..100 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("timed out waiting for {what}");
}

#[tokio::test]
async fn handlers_see_existing_objects() {
    init_tracing();
    let client = Client::in_memory();
    let widgets = client.resource::<Widget>(Some("ns1"));

    let token = CancellationToken::new();
    let seen = Arc::new(AtomicUsize::new(0));
    let counter = seen.clone();
    widgets.add_handler(
        &token,
        "counter",
        handler_fn(move |_key, obj: Option<Widget>| {
            let counter = counter.clone();
            async move {
                if obj.is_some() {
                    counter.fetch_add(1, Ordering::SeqCst);
                }
                Ok(None)
            }
        }),
    );

    widgets
        .create(&new_object("ns1", "a", Widget::default()))
        .await
        .unwrap();
    widgets
        .create(&new_object("ns1", "b", Widget::default()))
        .await
        .unwrap();

    client.start(&token);

    let seen = seen.clone();
    eventually("both widgets to sync", move || {
        seen.load(Ordering::SeqCst) >= 2
    })
    .await;
    token.cancel();
}

#[tokio::test]
async fn foreign_namespace_objects_never_dispatch() {
    init_tracing();
    let client = Client::in_memory();
    let widgets = client.resource::<Widget>(Some("ns1"));

    let token = CancellationToken::new();
    let local = Arc::new(AtomicUsize::new(0));
    let foreign = Arc::new(AtomicUsize::new(0));
    let (l, f) = (local.clone(), foreign.clone());
    widgets.add_handler(
        &token,
        "scoped",
        handler_fn(move |key: String, _obj: Option<Widget>| {
            let (l, f) = (l.clone(), f.clone());
            async move {
                if key.starts_with("ns1/") {
                    l.fetch_add(1, Ordering::SeqCst);
                } else {
                    f.fetch_add(1, Ordering::SeqCst);
                }
                Ok(None)
            }
        }),
    );

    client.start(&token);

    // same family, different namespace; must stay invisible to ns1
    widgets
        .create(&new_object("ns2", "elsewhere", Widget::default()))
        .await
        .unwrap();
    widgets
        .create(&new_object("ns1", "here", Widget::default()))
        .await
        .unwrap();

    let l = local.clone();
    eventually("the ns1 widget to sync", move || {
        l.load(Ordering::SeqCst) >= 1
    })
    .await;
    assert_eq!(foreign.load(Ordering::SeqCst), 0);
    token.cancel();
}

#[tokio::test]
async fn lister_follows_the_watch() {
    init_tracing();
    let client = Client::in_memory();
    let widgets = client.resource::<Widget>(Some("ns1"));
    let lister = widgets.lister();

    let token = CancellationToken::new();
    client.start(&token);

    widgets
        .create(&new_object("ns1", "cached", Widget::default()))
        .await
        .unwrap();

    eventually("the cache to pick up the object", move || {
        lister.get("", "cached").is_ok()
    })
    .await;
    token.cancel();
}

#[tokio::test]
async fn lifecycle_stamps_then_finalizes() {
    init_tracing();
    let client = Client::in_memory();
    let widgets = client.resource::<Widget>(Some("ns1"));

    let token = CancellationToken::new();
    let removes = Arc::new(AtomicUsize::new(0));
    let remove_counter = removes.clone();
    widgets.add_lifecycle(
        &token,
        "reaper",
        Arc::new(
            LifecycleDelegate::new()
                .with_create(|obj: Widget| async move { Ok(Some(obj)) })
                .with_remove(move |_obj: Widget| {
                    let remove_counter = remove_counter.clone();
                    async move {
                        remove_counter.fetch_add(1, Ordering::SeqCst);
                        Ok(None)
                    }
                }),
        ),
    );

    widgets
        .create(&new_object("ns1", "doomed", Widget::default()))
        .await
        .unwrap();

    client.start(&token);

    let mut stamped = false;
    for _ in 0..100 {
        if let Ok(w) = widgets.get("doomed", &Default::default()).await {
            if w.finalizers()
                .contains(&"controller.kindred.dev/reaper".to_string())
            {
                stamped = true;
                break;
            }
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(stamped, "timed out waiting for the finalizer to be stamped");

    widgets.delete("doomed", &Default::default()).await.unwrap();

    let mut released = false;
    for _ in 0..100 {
        if let Err(e) = widgets.get("doomed", &Default::default()).await {
            if e.is_not_found() {
                released = true;
                break;
            }
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(released, "timed out waiting for the object to be released");
    assert_eq!(removes.load(Ordering::SeqCst), 1);
    token.cancel();
}
