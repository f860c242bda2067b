//! OpenAPI document for the JSON surface.

use utoipa::OpenApi;

use crate::api::handlers::{account, auth, studio, subscription};
use crate::platform;
use crate::studio as studio_state;

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::login::login,
        auth::signup::signup,
        auth::session::session,
        auth::session::logout,
        auth::verify::verify_email,
        auth::verify::resend_confirmation,
        auth::recovery::forgot_password,
        auth::recovery::reset_password_landing,
        auth::recovery::reset_password,
        account::profile,
        account::update_profile,
        account::delete_account,
        subscription::get_subscription,
        subscription::upsert_subscription,
        subscription::patch_subscription,
        subscription::plans,
        studio::shell_state,
        studio::select_tool,
        studio::set_workspace,
        studio::add_sheet,
        studio::duplicate_sheet,
        studio::update_sheet,
        studio::remove_sheet,
        studio::toggle_layer,
    ),
    components(schemas(
        auth::types::LoginRequest,
        auth::types::SignupRequest,
        auth::types::EmailRequest,
        auth::types::ResetPasswordRequest,
        auth::types::ProfileResponse,
        auth::types::MessageResponse,
        auth::types::ErrorResponse,
        auth::types::FieldErrorResponse,
        auth::types::FlowResponse,
        account::ProfileUpdateRequest,
        subscription::SubscriptionEnvelope,
        subscription::PlansResponse,
        subscription::UpsertSubscriptionRequest,
        subscription::PatchSubscriptionRequest,
        studio::SelectToolRequest,
        studio::SheetPatchRequest,
        platform::Subscription,
        platform::SubscriptionStatus,
        platform::Plan,
        studio_state::Shell,
        studio_state::Sheet,
        studio_state::Layer,
        studio_state::Workspace,
        studio_state::DrawTool,
        studio_state::TransformMode,
    )),
    tags(
        (name = "auth", description = "Authentication and email-link flows"),
        (name = "account", description = "Profile and account lifecycle"),
        (name = "subscription", description = "Entitlement projection"),
        (name = "studio", description = "Editor shell state")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_builds_and_lists_auth_paths() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/auth/login"));
        assert!(doc.paths.paths.contains_key("/auth/verify-email"));
        assert!(doc.paths.paths.contains_key("/api/subscription"));
        assert!(doc.paths.paths.contains_key("/api/studio/state"));
    }
}
