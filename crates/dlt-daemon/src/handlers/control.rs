//! Serving decoded control requests against the message filter.

use bytes::{Buf, BufMut, BytesMut};
use dlt_event_handler::EventHandler;
use dlt_types::service::{is_injection, GET_FILTER_STATUS, SET_FILTER_LEVEL};
use dlt_types::ServiceResponse;
use tracing::{debug, info, warn};

use crate::control::{ControlRequest, ControlResponse, InjectionTarget};
use crate::level::apply_filter_level;
use crate::state::DaemonState;

/// Answer one request. Every request gets a response.
pub fn serve_request(
    state: &mut DaemonState,
    events: &mut EventHandler,
    request: &ControlRequest,
) -> ControlResponse {
    state.stats.control_requests += 1;
    let id = request.service_id;

    let response = if is_injection(id) {
        serve_injection(state, request)
    } else {
        match state.filter.control_allowed(id) {
            Ok(true) => serve_control(state, events, request),
            Ok(false) => ControlResponse::status(id, ServiceResponse::PermDenied),
            Err(e) => {
                debug!(service_id = id, error = %e, "Unknown control service");
                ControlResponse::status(id, ServiceResponse::NotSupported)
            }
        }
    };

    if response.status == ServiceResponse::PermDenied {
        state.stats.denied_requests += 1;
        info!(
            service_id = %format!("{id:#x}"),
            level = state.filter.level(),
            "Control request denied"
        );
    }
    response
}

fn serve_control(
    state: &mut DaemonState,
    events: &mut EventHandler,
    request: &ControlRequest,
) -> ControlResponse {
    let id = request.service_id;
    match id {
        SET_FILTER_LEVEL => {
            if request.payload.len() != 4 {
                return ControlResponse::status(id, ServiceResponse::Error);
            }
            let level = (&request.payload[..]).get_u32_le();
            match apply_filter_level(state, events, level) {
                Ok(_) => ControlResponse::status(id, ServiceResponse::Ok),
                Err(e) => {
                    warn!(level, error = %e, "Filter level not applied");
                    ControlResponse::status(id, ServiceResponse::Error)
                }
            }
        }
        GET_FILTER_STATUS => {
            let segment = &state.filter.current_segment().name;
            let mut payload = BytesMut::with_capacity(4 + segment.len());
            payload.put_u32_le(state.filter.level());
            payload.put_slice(segment.as_bytes());
            ControlResponse::status(id, ServiceResponse::Ok).with_payload(payload.freeze())
        }
        _ => ControlResponse::status(id, ServiceResponse::NotSupported),
    }
}

fn serve_injection(state: &DaemonState, request: &ControlRequest) -> ControlResponse {
    let id = request.service_id;
    let target = match InjectionTarget::parse(&request.payload) {
        Ok(target) => target,
        Err(e) => {
            warn!(service_id = id, error = %e, "Malformed injection");
            return ControlResponse::status(id, ServiceResponse::Error);
        }
    };

    match state
        .filter
        .injection_allowed(&target.app_id, &target.context_id, &target.ecu_id, id)
    {
        Ok(true) => {
            debug!(
                service_id = id,
                app_id = %target.app_id,
                context_id = %target.context_id,
                "Injection accepted"
            );
            ControlResponse::status(id, ServiceResponse::Ok)
        }
        Ok(false) => ControlResponse::status(id, ServiceResponse::PermDenied),
        Err(e) => {
            warn!(service_id = id, error = %e, "Injection check failed");
            ControlResponse::status(id, ServiceResponse::Error)
        }
    }
}
