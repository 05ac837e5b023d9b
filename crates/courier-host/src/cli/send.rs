//! `courier send` -- dispatch a request by identity.

use anyhow::Context;

use crate::state::AppState;

/// Parse `payload` and dispatch it to the request registered as `identity`.
pub async fn dispatch(
    state: &AppState,
    identity: &str,
    payload: &str,
) -> anyhow::Result<Option<serde_json::Value>> {
    let payload: serde_json::Value =
        serde_json::from_str(payload).context("payload is not valid JSON")?;
    let response = state.mediator.send_json(identity, payload, None).await?;
    Ok(response)
}

pub async fn send_request(
    state: &AppState,
    identity: &str,
    payload: &str,
    json: bool,
) -> anyhow::Result<()> {
    let response = dispatch(state, identity, payload).await?;
    match (response, json) {
        (Some(value), true) => println!("{}", serde_json::to_string(&value)?),
        (Some(value), false) => println!("{}", serde_json::to_string_pretty(&value)?),
        (None, true) => println!("null"),
        (None, false) => println!("No handler registered for '{identity}'"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_types::{MediatorOptions, TypeDescriptor};

    use crate::services::orders::PlaceOrder;

    #[tokio::test]
    async fn dispatch_places_order_by_short_name() {
        let state = AppState::with_options(MediatorOptions::short_names());
        let response = dispatch(
            &state,
            "PlaceOrder",
            r#"{"customer":"ada","sku":"widget","quantity":2}"#,
        )
        .await
        .unwrap()
        .unwrap();

        assert_eq!(response["total_cents"], 2_500);
        assert_eq!(state.book.len(), 1);
    }

    #[tokio::test]
    async fn dispatch_by_full_name() {
        let state = AppState::with_options(MediatorOptions::default());
        let identity = TypeDescriptor::of::<PlaceOrder>().full_name;
        let response = dispatch(
            &state,
            identity,
            r#"{"customer":"ada","sku":"widget","quantity":1}"#,
        )
        .await
        .unwrap();
        assert!(response.is_some());
    }

    #[tokio::test]
    async fn dispatch_unknown_identity_is_none() {
        let state = AppState::with_options(MediatorOptions::short_names());
        let response = dispatch(&state, "CancelOrder", "{}").await.unwrap();
        assert!(response.is_none());
    }

    #[tokio::test]
    async fn dispatch_rejects_null_and_bad_json() {
        let state = AppState::with_options(MediatorOptions::short_names());
        assert!(dispatch(&state, "PlaceOrder", "null").await.is_err());
        assert!(dispatch(&state, "PlaceOrder", "{not json").await.is_err());
    }
}
