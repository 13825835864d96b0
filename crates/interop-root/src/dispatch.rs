//! The request/response dispatch table (§4.I): turns a decoded
//! `RequestPayload` plus its source identity into domain-engine calls and a
//! `ResponsePayload`, fanning out whatever events the engines decide are
//! owed to other live instances along the way.

use crate::root::Root;
use interop_domain::{AppIntent, AppMetadata, IntentEngine, OpenOrchestrator};
use interop_ports::OpenRequestDescriptor;
use interop_protocol::{
    AppIdentifierRef, AppIntentWire, AppMetadataWire, EventEnvelope, EventMeta, EventPayload,
    IntentResolutionWire, RequestPayload, ResponseEnvelope, ResponseMeta, ResponsePayload,
};
use interop_types::{
    ChannelId, Context, FullyQualifiedAppIdentifier, InstanceId, ListenerId, RequestUuid,
    ToWireError, WireError,
};
use serde_json::Value;

impl Root {
    /// Core dispatch, shared by the transport-facing `InboundHandler` path
    /// and the in-process `RootApi` self-dispatch short-circuit (§9).
    /// `request_uuid` is the envelope's own, or a freshly minted one for
    /// self-dispatch callers that have no envelope of their own.
    pub(crate) async fn route(
        &self,
        source: FullyQualifiedAppIdentifier,
        request_uuid: RequestUuid,
        request: RequestPayload,
    ) -> Option<ResponsePayload> {
        match request {
            RequestPayload::FindInstances { app } => {
                let app_id = self.directory.qualify(&app.app_id);
                let response = match self.directory.get_app_instances(&app_id).await {
                    Some(instances) => ResponsePayload::FindInstances { instances, error: None },
                    None => ResponsePayload::FindInstances {
                        instances: Vec::new(),
                        error: Some(WireError::NoAppsFound),
                    },
                };
                Some(response)
            }

            RequestPayload::GetAppMetadata { app } => {
                let response = match self.resolve_app_ref(&app) {
                    Some(identifier) => match self.directory.get_app_metadata(&identifier).await {
                        Some(meta) => ResponsePayload::GetAppMetadata {
                            app: Some(to_wire_metadata(meta)),
                            error: None,
                        },
                        None => ResponsePayload::GetAppMetadata {
                            app: None,
                            error: Some(WireError::TargetAppUnavailable),
                        },
                    },
                    None => ResponsePayload::GetAppMetadata {
                        app: None,
                        error: Some(WireError::TargetAppUnavailable),
                    },
                };
                Some(response)
            }

            RequestPayload::GetAppDirectoryApplication { app_id } => {
                let fq = self.directory.qualify(&app_id);
                let application = self.directory.get_app_directory_application(&fq).await;
                Some(ResponsePayload::GetAppDirectoryApplication { application })
            }

            RequestPayload::FindIntent { intent, context, result_type } => {
                let context_type = match context {
                    Some(value) => match Context::validate(&value) {
                        Ok(c) => Some(c.context_type),
                        Err(_) => {
                            return Some(ResponsePayload::FindIntent {
                                app_intent: None,
                                error: Some(WireError::MalformedContext),
                            })
                        }
                    },
                    None => None,
                };
                let app_intent = self
                    .directory
                    .get_app_intent(&intent, context_type.as_deref(), result_type.as_deref())
                    .await;
                let response = if app_intent.apps.is_empty() {
                    ResponsePayload::FindIntent { app_intent: None, error: Some(WireError::NoAppsFound) }
                } else {
                    ResponsePayload::FindIntent { app_intent: Some(to_wire_app_intent(app_intent)), error: None }
                };
                Some(response)
            }

            RequestPayload::FindIntentsByContext { context, result_type } => {
                let context_type = match Context::validate(&context) {
                    Ok(c) => c.context_type,
                    Err(_) => {
                        tracing::warn!("findIntentsByContextRequest carried a malformed context");
                        return Some(ResponsePayload::FindIntentsByContext { app_intents: Vec::new() });
                    }
                };
                let intents = self.directory.get_app_intents_for_context(&context_type, result_type.as_deref()).await;
                let app_intents = intents.into_iter().map(to_wire_app_intent).collect();
                Some(ResponsePayload::FindIntentsByContext { app_intents })
            }

            RequestPayload::GetContextForAppIntent { app, intent } => {
                let contexts = self
                    .resolve_app_ref(&app)
                    .and_then(|identifier| self.directory.get_context_for_app_intent(&identifier, &intent));
                Some(ResponsePayload::GetContextForAppIntent { contexts })
            }

            RequestPayload::AddIntentListener { intent, contexts } => {
                let declared: Vec<Context> = contexts.into_iter().map(Context::new).collect();
                let response = match self.directory.register_intent_listener(&source, intent.clone(), declared).await {
                    Ok(()) => {
                        self.intents.notify_listener_registered(&source, &intent);
                        self.open.notify_context_listener_registered(&source);
                        let listener_id = ListenerId::new(format!("intent-listener-{}", uuid::Uuid::new_v4()));
                        self.intent_listener_owners.insert(listener_id.clone(), (source.clone(), intent));
                        ResponsePayload::AddIntentListener { listener_uuid: Some(listener_id), error: None }
                    }
                    Err(e) => ResponsePayload::AddIntentListener { listener_uuid: None, error: Some(e.to_wire_error()) },
                };
                Some(response)
            }

            RequestPayload::IntentListenerUnsubscribe { listener_uuid } => {
                if let Some((_, (identifier, intent))) = self.intent_listener_owners.remove(&listener_uuid) {
                    self.directory.unregister_intent_listener(&identifier, &intent);
                }
                Some(ResponsePayload::IntentListenerUnsubscribe {})
            }

            RequestPayload::RaiseIntent { intent, context, app } => {
                let context = match IntentEngine::validate_context(&context) {
                    Ok(c) => c,
                    Err(e) => {
                        return Some(ResponsePayload::RaiseIntent { intent_resolution: None, error: Some(e.to_wire_error()) })
                    }
                };
                let app_filter = app.as_ref().map(|a| self.app_ref_filter(a));
                let target = match self
                    .directory
                    .resolve_app_instance_for_intent(&intent, &context.context_type, app_filter.as_ref())
                    .await
                {
                    Ok(t) => t,
                    Err(e) => {
                        return Some(ResponsePayload::RaiseIntent { intent_resolution: None, error: Some(e.to_wire_error()) })
                    }
                };
                let resolution = self.complete_intent_raise(source, request_uuid, intent, context, target).await;
                Some(ResponsePayload::RaiseIntent { intent_resolution: Some(resolution), error: None })
            }

            RequestPayload::RaiseIntentForContext { context, app } => {
                let context = match IntentEngine::validate_context(&context) {
                    Ok(c) => c,
                    Err(e) => {
                        return Some(ResponsePayload::RaiseIntentForContext {
                            intent_resolution: None,
                            error: Some(e.to_wire_error()),
                        })
                    }
                };
                let app_id_filter = app.as_ref().map(|a| self.directory.qualify(&a.app_id));
                let (intent, target) = match self
                    .directory
                    .resolve_app_instance_for_context(&context.context_type, app_id_filter.as_ref())
                    .await
                {
                    Ok(pair) => pair,
                    Err(e) => {
                        return Some(ResponsePayload::RaiseIntentForContext {
                            intent_resolution: None,
                            error: Some(e.to_wire_error()),
                        })
                    }
                };
                let resolution = self.complete_intent_raise(source, request_uuid, intent, context, target).await;
                Some(ResponsePayload::RaiseIntentForContext { intent_resolution: Some(resolution), error: None })
            }

            RequestPayload::IntentResult { raise_intent_request_uuid, result } => {
                let token = interop_domain::PendingIntentToken::from(raise_intent_request_uuid);
                match self.intents.complete_raise(&token, result.clone()) {
                    Ok((originator, _original_request_uuid)) => {
                        if let Some(channel_id) = extract_private_channel_id(&result) {
                            self.channels.grant_private_access(&channel_id, originator);
                        }
                    }
                    Err(e) => tracing::debug!(error = %e, "intentResultRequest could not be completed"),
                }
                Some(ResponsePayload::IntentResult {})
            }

            RequestPayload::Open { app, context } => Some(self.handle_open(source, app, context).await),

            RequestPayload::NotifyContext { connection_attempt_uuid } => {
                self.open.resolve_identity(&connection_attempt_uuid, source);
                None
            }

            RequestPayload::GetOrCreateChannel { channel_id } => {
                let channel = self.channels.get_or_create_channel(channel_id);
                Some(ResponsePayload::GetOrCreateChannel { channel: Some(channel), error: None })
            }

            RequestPayload::CreatePrivateChannel => {
                let channel = self.channels.create_private_channel(source);
                Some(ResponsePayload::CreatePrivateChannel { channel })
            }

            RequestPayload::Broadcast { channel_id, context } => {
                let context = match Context::validate(&context) {
                    Ok(c) => c,
                    Err(_) => return Some(ResponsePayload::Broadcast { error: Some(WireError::MalformedContext) }),
                };
                let response = match self.channels.broadcast(&channel_id, context, &source) {
                    Ok(deliveries) => {
                        self.deliver(deliveries).await;
                        ResponsePayload::Broadcast { error: None }
                    }
                    Err(e) => ResponsePayload::Broadcast { error: Some(e.to_wire_error()) },
                };
                Some(response)
            }

            RequestPayload::AddContextListener { channel_id, context_type } => {
                let response = match self.channels.add_context_listener(source.clone(), channel_id, context_type) {
                    Ok((listener_id, deliveries)) => {
                        self.deliver(deliveries).await;
                        self.open.notify_context_listener_registered(&source);
                        ResponsePayload::AddContextListener { listener_uuid: Some(listener_id), error: None }
                    }
                    Err(e) => ResponsePayload::AddContextListener { listener_uuid: None, error: Some(e.to_wire_error()) },
                };
                Some(response)
            }

            RequestPayload::GetCurrentContext { channel_id, context_type } => {
                let context = self.channels.get_current_context(&channel_id, context_type.as_deref());
                Some(ResponsePayload::GetCurrentContext { context })
            }

            RequestPayload::JoinUserChannel { channel_id } => {
                let response = match self.channels.join_user_channel(source.clone(), channel_id.clone()) {
                    Ok(()) => {
                        if self.events.wants_agent_event(&source, "userChannelChanged") {
                            self.deliver_event(&source, EventPayload::UserChannelChanged { channel_id: Some(channel_id) }).await;
                        }
                        ResponsePayload::JoinUserChannel { error: None }
                    }
                    Err(e) => ResponsePayload::JoinUserChannel { error: Some(e.to_wire_error()) },
                };
                Some(response)
            }

            RequestPayload::GetUserChannels => {
                Some(ResponsePayload::GetUserChannels { channels: self.channels.get_user_channels() })
            }

            RequestPayload::LeaveCurrentChannel => {
                self.channels.leave_current_channel(&source);
                if self.events.wants_agent_event(&source, "userChannelChanged") {
                    self.deliver_event(&source, EventPayload::UserChannelChanged { channel_id: None }).await;
                }
                Some(ResponsePayload::LeaveCurrentChannel {})
            }

            RequestPayload::Unsubscribe { listener_uuid } => {
                let deliveries = self.channels.unsubscribe(&listener_uuid);
                self.deliver(deliveries).await;
                Some(ResponsePayload::Unsubscribe {})
            }

            RequestPayload::AddEventListener { event_type } => {
                let listener_id = self.events.add_agent_listener(source, event_type);
                Some(ResponsePayload::AddEventListener { listener_uuid: Some(listener_id), error: None })
            }

            RequestPayload::RemoveEventListener { listener_uuid } => {
                self.events.remove_agent_listener(&listener_uuid);
                Some(ResponsePayload::RemoveEventListener {})
            }

            RequestPayload::HeartbeatAcknowledgement { heartbeat_event_uuid } => {
                if let Some(monitor) = self.heartbeats.get(&source) {
                    monitor.acknowledge(&heartbeat_event_uuid);
                }
                None
            }
        }
    }

    async fn handle_open(&self, source: FullyQualifiedAppIdentifier, app: AppIdentifierRef, context: Option<Value>) -> ResponsePayload {
        let app_id = self.directory.qualify(&app.app_id);
        let Some(record) = self.directory.get_app_directory_application(&app_id).await else {
            return ResponsePayload::Open { app_identifier: None, error: Some(WireError::AppNotFound) };
        };
        let context = match context {
            Some(value) => match Context::validate(&value) {
                Ok(c) => Some(c),
                Err(_) => return ResponsePayload::Open { app_identifier: None, error: Some(WireError::MalformedContext) },
            },
            None => None,
        };

        let descriptor = OpenRequestDescriptor { app_directory_record: record, context: context.clone() };
        let attempt = match self.open.launch(&descriptor).await {
            Ok(a) => a,
            Err(e) => return ResponsePayload::Open { app_identifier: None, error: Some(e.to_wire_error()) },
        };

        let rx = self.open.begin_awaiting_identity(attempt);
        let identity = match OpenOrchestrator::await_identity(rx, self.identity_timeout).await {
            Ok(identity) => identity,
            Err(e) => return ResponsePayload::Open { app_identifier: None, error: Some(e.to_wire_error()) },
        };

        if let Some(context) = context {
            let context_type = context.context_type.clone();
            let listener_ready = self
                .open
                .await_context_listener(&identity, self.context_handoff_timeout, || {
                    self.channels.has_matching_context_listener(&identity, &context_type)
                })
                .await;
            if let Err(e) = listener_ready {
                return ResponsePayload::Open { app_identifier: Some(identity), error: Some(e.to_wire_error()) };
            }
            self.deliver_event(&identity, EventPayload::Broadcast { channel_id: None, context, originating_app: source }).await;
        }

        ResponsePayload::Open { app_identifier: Some(identity), error: None }
    }

    /// Begin tracking a raise, wait for the target's listener, deliver the
    /// `intentEvent`, and spawn the task that will eventually deliver the
    /// asynchronous `raiseIntentResultResponse` to `originator` (§4.E steps
    /// 3-5, `onIntentResult` step 4).
    async fn complete_intent_raise(
        &self,
        originator: FullyQualifiedAppIdentifier,
        request_uuid: RequestUuid,
        intent: String,
        context: Context,
        target: FullyQualifiedAppIdentifier,
    ) -> IntentResolutionWire {
        let directory = &self.directory;
        self.intents
            .await_intent_listener(&target, &intent, || directory.has_intent_listener(&target, &intent))
            .await;

        let (token, rx) = self.intents.begin_raise(originator.clone(), request_uuid.clone(), target.clone());
        self.deliver_event(
            &target,
            EventPayload::Intent {
                intent: intent.clone(),
                context,
                originating_app: originator.clone(),
                raise_intent_request_uuid: token.as_str().to_string(),
            },
        )
        .await;

        let root = self.arc();
        tokio::spawn(async move {
            let payload = match rx.await {
                Ok(value) => ResponsePayload::RaiseIntentResult { intent_result: Some(value), error: None },
                Err(_) => {
                    tracing::debug!(originator = %originator, "raise intent result channel dropped, target likely disconnected");
                    ResponsePayload::RaiseIntentResult { intent_result: None, error: Some(WireError::IntentDeliveryFailed) }
                }
            };
            if let Some(channel_id) = root.connections.channel_for(&originator) {
                let meta = ResponseMeta::reply_to(request_uuid, Root::identity(), root.clock.now_rfc3339());
                root.gateway.send_response(channel_id, ResponseEnvelope { payload, meta }).await;
            }
        });

        IntentResolutionWire { source: target, intent }
    }

    /// Resolve an `AppIdentifierRef` to a live instance, requiring an
    /// explicit `instanceId` — directory queries that name only an `appId`
    /// with no instance can't be narrowed to one live connection, so they
    /// resolve to "unavailable" rather than guessing (§4.C).
    fn resolve_app_ref(&self, app: &AppIdentifierRef) -> Option<FullyQualifiedAppIdentifier> {
        let instance_id = app.instance_id.as_deref()?;
        let app_id = self.directory.qualify(&app.app_id);
        Some(FullyQualifiedAppIdentifier::new(app_id, InstanceId::new(instance_id)))
    }

    /// Build a filter-only identifier for `resolveAppInstanceForIntent`'s
    /// `app` parameter, which narrows candidates by appId and only
    /// shortcuts on an exact instance match. When `app` carries no
    /// instanceId, the empty sentinel instance never matches a live one, so
    /// this only ever contributes the appId filter in that case.
    fn app_ref_filter(&self, app: &AppIdentifierRef) -> FullyQualifiedAppIdentifier {
        let app_id = self.directory.qualify(&app.app_id);
        let instance_id = app.instance_id.as_deref().map(InstanceId::new).unwrap_or_else(|| InstanceId::new(""));
        FullyQualifiedAppIdentifier::new(app_id, instance_id)
    }

    pub(crate) async fn deliver_event(&self, target: &FullyQualifiedAppIdentifier, event: EventPayload) {
        if let Some(channel_id) = self.connections.channel_for(target) {
            let meta = EventMeta::new(self.clock.now_rfc3339());
            self.gateway.send_event(channel_id, EventEnvelope { payload: event, meta }).await;
        }
    }

    pub(crate) async fn deliver(&self, deliveries: Vec<interop_domain::Delivery>) {
        for delivery in deliveries {
            self.deliver_event(&delivery.target, delivery.event).await;
        }
    }
}

fn to_wire_metadata(meta: AppMetadata) -> AppMetadataWire {
    AppMetadataWire { app_id: meta.app_id.as_str().to_string(), name: meta.name, result_type: meta.result_type }
}

fn to_wire_app_intent(intent: AppIntent) -> AppIntentWire {
    AppIntentWire {
        intent: intent.intent,
        apps: intent.apps.into_iter().map(to_wire_metadata).collect(),
    }
}

/// `onIntentResult` step 3: a target's result carrying `{channel: {id,
/// type: "private"}}` grants the originator access to that private channel
/// (§4.E "Automatic private-channel grant").
fn extract_private_channel_id(value: &Value) -> Option<ChannelId> {
    let channel = value.get("channel")?;
    if channel.get("type").and_then(Value::as_str) != Some("private") {
        return None;
    }
    channel.get("id").and_then(Value::as_str).map(ChannelId::new)
}
