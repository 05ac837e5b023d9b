//! Request dispatch.
//!
//! A request goes to exactly one handler, or to none:
//! 1. Derive the identity of the request type
//! 2. Ask the scanner for registered types in the configured modules whose
//!    identity matches exactly (case-sensitive)
//! 3. Open a resolution scope and invoke the first candidate whose handler
//!    resolves; later candidates are ignored
//! 4. No resolvable candidate is a silent no-op
//!
//! The caller's own instance and cancellation token are forwarded to the
//! handler. Handler errors propagate to the caller.

use anyhow::anyhow;
use courier_types::Request;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use uuid::Uuid;

use super::{Mediator, MediatorError};
use crate::identity::MessageIdentity;
use crate::registry::RequestDescriptor;

impl Mediator {
    /// Send a request that produces no response.
    ///
    /// Returns `Ok(())` both when the handler completed and when no handler
    /// is registered.
    pub async fn send<R>(
        &self,
        request: R,
        cancel: Option<CancellationToken>,
    ) -> Result<(), MediatorError>
    where
        R: Request<Response = ()>,
    {
        self.send_with_response(request, cancel).await.map(|_| ())
    }

    /// Send a request and return its handler's response.
    ///
    /// Returns `Ok(None)` when no handler is registered for the request.
    pub async fn send_with_response<R: Request>(
        &self,
        request: R,
        cancel: Option<CancellationToken>,
    ) -> Result<Option<R::Response>, MediatorError> {
        let identity = MessageIdentity::of::<R>(&self.options);
        let dispatch_id = Uuid::now_v7();
        let candidates = self.request_candidates(&identity);

        let mut scope = self.provider.create_scope();
        let handler = candidates
            .iter()
            .filter(|candidate| {
                // Only a candidate of the caller's own type can take the
                // caller's instance.
                let usable = candidate.is::<R>() && candidate.responds_with::<R::Response>();
                if !usable {
                    debug!(
                        %identity,
                        %dispatch_id,
                        candidate = %candidate.descriptor,
                        "skipping candidate of another type"
                    );
                }
                usable
            })
            .find_map(|candidate| scope.resolve_request_handler(candidate));

        let Some(handler) = handler else {
            debug!(
                %identity,
                %dispatch_id,
                candidates = candidates.len(),
                "no request handler resolved"
            );
            return Ok(None);
        };

        debug!(
            %identity,
            %dispatch_id,
            handler = handler.handler_name(),
            "dispatching request"
        );
        let response = handler
            .handle_erased(
                Box::new(request),
                &self.options,
                cancel.unwrap_or_default(),
            )
            .await
            .map_err(|source| MediatorError::Handler {
                identity: identity.to_string(),
                source,
            })?;

        let response = response.downcast::<R::Response>().map_err(|_| MediatorError::Handler {
            identity: identity.to_string(),
            source: anyhow!("{} returned an unexpected response type", handler.handler_name()),
        })?;
        Ok(Some(*response))
    }

    /// Send a request and convert its response into a structurally
    /// compatible type `T` by way of a JSON round-trip.
    pub async fn send_as<R, T>(
        &self,
        request: R,
        cancel: Option<CancellationToken>,
    ) -> Result<Option<T>, MediatorError>
    where
        R: Request,
        R::Response: Serialize,
        T: DeserializeOwned,
    {
        let Some(response) = self.send_with_response(request, cancel).await? else {
            return Ok(None);
        };
        let coercion_error = |source| MediatorError::Coercion {
            identity: MessageIdentity::of::<R>(&self.options).to_string(),
            source,
        };
        let value = serde_json::to_value(&response).map_err(coercion_error)?;
        serde_json::from_value(value).map(Some).map_err(coercion_error)
    }

    /// Send a request known only by identity, with a JSON payload.
    ///
    /// Only types registered through `json_request_handler` are candidates.
    /// The payload is decoded into the first candidate whose handler
    /// resolves, and the response is encoded back to JSON.
    pub async fn send_json(
        &self,
        identity: &str,
        payload: serde_json::Value,
        cancel: Option<CancellationToken>,
    ) -> Result<Option<serde_json::Value>, MediatorError> {
        if identity.is_empty() {
            return Err(MediatorError::InvalidArgument(
                "request identity is empty".to_string(),
            ));
        }
        if payload.is_null() {
            return Err(MediatorError::InvalidArgument(format!(
                "request payload for '{identity}' is null"
            )));
        }

        let identity = MessageIdentity::new(identity);
        let dispatch_id = Uuid::now_v7();
        let candidates = self.request_candidates(&identity);

        let mut scope = self.provider.create_scope();
        let resolved = candidates.iter().find_map(|candidate| {
            let codec = *candidate.codec()?;
            let handler = scope.resolve_request_handler(candidate)?;
            Some((codec, handler))
        });

        let Some((codec, handler)) = resolved else {
            debug!(
                %identity,
                %dispatch_id,
                candidates = candidates.len(),
                "no dynamic request handler resolved"
            );
            return Ok(None);
        };

        let payload_error = |source| MediatorError::Payload {
            identity: identity.to_string(),
            source,
        };
        let request = codec.decode(payload).map_err(payload_error)?;

        debug!(
            %identity,
            %dispatch_id,
            handler = handler.handler_name(),
            "dispatching dynamic request"
        );
        let response = handler
            .handle_erased(request, &self.options, cancel.unwrap_or_default())
            .await
            .map_err(|source| MediatorError::Handler {
                identity: identity.to_string(),
                source,
            })?;

        codec.encode(response).map(Some).map_err(payload_error)
    }

    /// Registered request types whose identity equals `identity` exactly.
    fn request_candidates(&self, identity: &MessageIdentity) -> Vec<RequestDescriptor> {
        self.scanner
            .candidate_types(&self.options.modules)
            .into_iter()
            .filter(|candidate| {
                let own = MessageIdentity::resolve(&candidate.descriptor, &self.options);
                identity.matches_exact(own.as_str())
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use courier_types::{MediatorOptions, TypeDescriptor};
    use serde::Deserialize;

    use crate::handler::{HandlerError, RequestHandler};
    use crate::registry::{HandlerRegistry, RegistryBuilder};

    use super::*;

    mod users {
        use super::*;

        #[derive(Debug, Default, Deserialize)]
        pub struct GetUser {
            pub id: u64,
        }
        impl Request for GetUser {
            type Response = User;
        }

        #[derive(Debug, Clone, PartialEq, Serialize)]
        pub struct User {
            pub id: u64,
            pub name: String,
        }

        #[derive(Debug, Deserialize)]
        pub struct DeleteUser {
            pub id: u64,
        }
        impl Request for DeleteUser {
            type Response = ();
        }
    }

    mod legacy {
        use super::*;

        #[derive(Debug, Deserialize)]
        pub struct DeleteUser {
            pub id: u64,
        }
        impl Request for DeleteUser {
            type Response = ();
        }
    }

    /// Same field names as `users::User`, distinct type.
    #[derive(Debug, PartialEq, Deserialize)]
    struct UserView {
        id: u64,
        name: String,
    }

    #[derive(Debug, Deserialize)]
    struct Unrelated {
        #[allow(dead_code)]
        email: String,
    }

    struct GetUserHandler {
        calls: Arc<AtomicUsize>,
    }

    impl RequestHandler<users::GetUser> for GetUserHandler {
        async fn handle(
            &self,
            request: users::GetUser,
            _options: &MediatorOptions,
            _cancel: CancellationToken,
        ) -> Result<users::User, HandlerError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(users::User {
                id: request.id,
                name: format!("user-{}", request.id),
            })
        }
    }

    struct DeleteUserHandler {
        deleted: Arc<AtomicUsize>,
        fail: bool,
    }

    impl RequestHandler<users::DeleteUser> for DeleteUserHandler {
        async fn handle(
            &self,
            request: users::DeleteUser,
            _options: &MediatorOptions,
            cancel: CancellationToken,
        ) -> Result<(), HandlerError> {
            if self.fail {
                anyhow::bail!("user {} is locked", request.id);
            }
            if cancel.is_cancelled() {
                anyhow::bail!("cancelled");
            }
            self.deleted.store(request.id as usize, Ordering::SeqCst);
            Ok(())
        }
    }

    struct LegacyDeleteHandler {
        calls: Arc<AtomicUsize>,
    }

    impl RequestHandler<legacy::DeleteUser> for LegacyDeleteHandler {
        async fn handle(
            &self,
            _request: legacy::DeleteUser,
            _options: &MediatorOptions,
            _cancel: CancellationToken,
        ) -> Result<(), HandlerError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn builder(options: MediatorOptions) -> RegistryBuilder {
        HandlerRegistry::builder(Arc::new(options))
    }

    fn mediator(builder: RegistryBuilder) -> Mediator {
        Mediator::from_registry(Arc::new(builder.build()))
    }

    fn counter() -> Arc<AtomicUsize> {
        Arc::new(AtomicUsize::new(0))
    }

    #[tokio::test]
    async fn send_invokes_single_handler_once() {
        let calls = counter();
        let c = Arc::clone(&calls);
        let mediator = mediator(
            builder(MediatorOptions::default()).json_request_handler::<users::GetUser, _, _>(
                move || GetUserHandler {
                    calls: Arc::clone(&c),
                },
            ),
        );

        let user = mediator
            .send_with_response(users::GetUser { id: 7 }, None)
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            user,
            Some(users::User {
                id: 7,
                name: "user-7".to_string()
            })
        );
    }

    #[tokio::test]
    async fn send_forwards_caller_field_values() {
        let deleted = counter();
        let d = Arc::clone(&deleted);
        let mediator = mediator(builder(MediatorOptions::default()).request_handler::<
            users::DeleteUser,
            _,
            _,
        >(move || DeleteUserHandler {
            deleted: Arc::clone(&d),
            fail: false,
        }));

        mediator
            .send(users::DeleteUser { id: 42 }, None)
            .await
            .unwrap();
        assert_eq!(deleted.load(Ordering::SeqCst), 42);
    }

    #[tokio::test]
    async fn send_without_handler_returns_default() {
        let mediator = mediator(builder(MediatorOptions::default()));

        let user = mediator
            .send_with_response(users::GetUser::default(), None)
            .await
            .unwrap();
        assert!(user.is_none());

        mediator
            .send(users::DeleteUser { id: 1 }, None)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn handler_error_propagates_to_caller() {
        let mediator = mediator(builder(MediatorOptions::default()).request_handler::<
            users::DeleteUser,
            _,
            _,
        >(|| DeleteUserHandler {
            deleted: counter(),
            fail: true,
        }));

        let err = mediator
            .send(users::DeleteUser { id: 3 }, None)
            .await
            .unwrap_err();
        match err {
            MediatorError::Handler { identity, source } => {
                assert!(identity.ends_with("DeleteUser"));
                assert_eq!(source.to_string(), "user 3 is locked");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn caller_cancellation_reaches_handler() {
        let deleted = counter();
        let d = Arc::clone(&deleted);
        let mediator = mediator(builder(MediatorOptions::default()).request_handler::<
            users::DeleteUser,
            _,
            _,
        >(move || DeleteUserHandler {
            deleted: Arc::clone(&d),
            fail: false,
        }));

        let token = CancellationToken::new();
        token.cancel();
        let result = mediator.send(users::DeleteUser { id: 9 }, Some(token)).await;

        assert!(matches!(result, Err(MediatorError::Handler { .. })));
        assert_eq!(deleted.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn send_as_coerces_into_compatible_type() {
        let mediator = mediator(
            builder(MediatorOptions::default())
                .request_handler::<users::GetUser, _, _>(|| GetUserHandler { calls: counter() }),
        );

        let view: Option<UserView> = mediator
            .send_as(users::GetUser { id: 5 }, None)
            .await
            .unwrap();
        assert_eq!(
            view,
            Some(UserView {
                id: 5,
                name: "user-5".to_string()
            })
        );
    }

    #[tokio::test]
    async fn send_as_reports_incompatible_shape() {
        let mediator = mediator(
            builder(MediatorOptions::default())
                .request_handler::<users::GetUser, _, _>(|| GetUserHandler { calls: counter() }),
        );

        let result = mediator
            .send_as::<_, Unrelated>(users::GetUser { id: 5 }, None)
            .await;
        assert!(matches!(result, Err(MediatorError::Coercion { .. })));
    }

    #[tokio::test]
    async fn first_registration_wins() {
        let first = counter();
        let second = counter();
        let (f, s) = (Arc::clone(&first), Arc::clone(&second));
        let mediator = mediator(
            builder(MediatorOptions::default())
                .request_handler::<users::GetUser, _, _>(move || GetUserHandler {
                    calls: Arc::clone(&f),
                })
                .request_handler::<users::GetUser, _, _>(move || GetUserHandler {
                    calls: Arc::clone(&s),
                }),
        );

        mediator
            .send_with_response(users::GetUser { id: 1 }, None)
            .await
            .unwrap();
        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn short_name_collision_only_reaches_callers_type() {
        let legacy_calls = counter();
        let l = Arc::clone(&legacy_calls);
        let deleted = counter();
        let d = Arc::clone(&deleted);
        let mediator = mediator(
            builder(MediatorOptions::short_names())
                .request_handler::<legacy::DeleteUser, _, _>(move || LegacyDeleteHandler {
                    calls: Arc::clone(&l),
                })
                .request_handler::<users::DeleteUser, _, _>(move || DeleteUserHandler {
                    deleted: Arc::clone(&d),
                    fail: false,
                }),
        );

        mediator
            .send(users::DeleteUser { id: 11 }, None)
            .await
            .unwrap();
        assert_eq!(legacy_calls.load(Ordering::SeqCst), 0);
        assert_eq!(deleted.load(Ordering::SeqCst), 11);
    }

    #[tokio::test]
    async fn types_outside_configured_modules_are_ignored() {
        let calls = counter();
        let c = Arc::clone(&calls);
        let options = MediatorOptions::default().with_modules(["somewhere::else"]);
        let mediator = mediator(builder(options).request_handler::<users::GetUser, _, _>(
            move || GetUserHandler {
                calls: Arc::clone(&c),
            },
        ));

        let user = mediator
            .send_with_response(users::GetUser { id: 1 }, None)
            .await
            .unwrap();
        assert!(user.is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn types_inside_configured_modules_are_candidates() {
        let module = TypeDescriptor::of::<users::GetUser>().module.to_string();
        let options = MediatorOptions::default().with_modules([module]);
        let mediator = mediator(
            builder(options)
                .request_handler::<users::GetUser, _, _>(|| GetUserHandler { calls: counter() }),
        );

        let user = mediator
            .send_with_response(users::GetUser { id: 2 }, None)
            .await
            .unwrap();
        assert!(user.is_some());
    }

    #[tokio::test]
    async fn send_json_dispatches_by_identity() {
        let mediator = mediator(
            builder(MediatorOptions::short_names())
                .json_request_handler::<users::GetUser, _, _>(|| GetUserHandler {
                    calls: counter(),
                }),
        );

        let response = mediator
            .send_json("GetUser", serde_json::json!({"id": 3}), None)
            .await
            .unwrap();
        assert_eq!(
            response,
            Some(serde_json::json!({"id": 3, "name": "user-3"}))
        );
    }

    #[tokio::test]
    async fn send_json_request_matching_is_case_sensitive() {
        let mediator = mediator(
            builder(MediatorOptions::short_names())
                .json_request_handler::<users::GetUser, _, _>(|| GetUserHandler {
                    calls: counter(),
                }),
        );

        let response = mediator
            .send_json("getuser", serde_json::json!({"id": 3}), None)
            .await
            .unwrap();
        assert!(response.is_none());
    }

    #[tokio::test]
    async fn send_json_skips_types_without_codec() {
        let mediator = mediator(
            builder(MediatorOptions::short_names())
                .request_handler::<users::GetUser, _, _>(|| GetUserHandler { calls: counter() }),
        );

        let response = mediator
            .send_json("GetUser", serde_json::json!({"id": 3}), None)
            .await
            .unwrap();
        assert!(response.is_none());
    }

    #[tokio::test]
    async fn send_json_runs_the_json_registrations_handler() {
        let plain = counter();
        let json = counter();
        let (p, j) = (Arc::clone(&plain), Arc::clone(&json));
        let mediator = mediator(
            builder(MediatorOptions::short_names())
                .request_handler::<users::GetUser, _, _>(move || GetUserHandler {
                    calls: Arc::clone(&p),
                })
                .json_request_handler::<users::GetUser, _, _>(move || GetUserHandler {
                    calls: Arc::clone(&j),
                }),
        );

        let response = mediator
            .send_json("GetUser", serde_json::json!({"id": 1}), None)
            .await
            .unwrap();
        assert_eq!(response.unwrap()["id"], 1);
        assert_eq!(plain.load(Ordering::SeqCst), 0);
        assert_eq!(json.load(Ordering::SeqCst), 1);

        mediator
            .send_with_response(users::GetUser { id: 2 }, None)
            .await
            .unwrap();
        assert_eq!(plain.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn send_json_rejects_missing_request() {
        let mediator = mediator(builder(MediatorOptions::short_names()));

        let null = mediator
            .send_json("GetUser", serde_json::Value::Null, None)
            .await;
        assert!(matches!(null, Err(MediatorError::InvalidArgument(_))));

        let empty = mediator.send_json("", serde_json::json!({}), None).await;
        assert!(matches!(empty, Err(MediatorError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn send_json_reports_payload_mismatch() {
        let mediator = mediator(
            builder(MediatorOptions::short_names())
                .json_request_handler::<users::GetUser, _, _>(|| GetUserHandler {
                    calls: counter(),
                }),
        );

        let result = mediator
            .send_json("GetUser", serde_json::json!({"id": "seven"}), None)
            .await;
        assert!(matches!(result, Err(MediatorError::Payload { .. })));
    }

    #[tokio::test]
    async fn send_json_void_request_returns_null() {
        let deleted = counter();
        let d = Arc::clone(&deleted);
        let mediator = mediator(builder(MediatorOptions::short_names()).json_request_handler::<
            users::DeleteUser,
            _,
            _,
        >(move || DeleteUserHandler {
            deleted: Arc::clone(&d),
            fail: false,
        }));

        let response = mediator
            .send_json("DeleteUser", serde_json::json!({"id": 4}), None)
            .await
            .unwrap();
        assert_eq!(response, Some(serde_json::Value::Null));
        assert_eq!(deleted.load(Ordering::SeqCst), 4);
    }
}
