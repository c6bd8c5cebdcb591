use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::favorites::{dtos as favorites_dtos, handlers as favorites_handlers};
use crate::features::files::{
    dtos as files_dtos, handlers as files_handlers, models as files_models,
};
use crate::features::users::handlers::{provisioning_handler, user_handler};
use crate::features::users::{dtos as users_dtos, models as users_models};
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Files
        files_handlers::generate_upload_url,
        files_handlers::create_file,
        files_handlers::list_files,
        files_handlers::delete_file,
        files_handlers::restore_file,
        // Favorites
        favorites_handlers::toggle_favorite,
        favorites_handlers::list_favorites,
        // Users
        user_handler::get_me,
        user_handler::get_user_profile,
        // Provisioning hooks
        provisioning_handler::create_user,
        provisioning_handler::update_user,
        provisioning_handler::add_membership,
        provisioning_handler::remove_membership,
    ),
    components(
        schemas(
            Meta,
            // Files
            files_models::FileType,
            files_dtos::CreateFileDto,
            files_dtos::FileResponseDto,
            files_dtos::FileStateResponseDto,
            files_dtos::UploadUrlResponseDto,
            ApiResponse<files_dtos::FileResponseDto>,
            ApiResponse<Vec<files_dtos::FileResponseDto>>,
            ApiResponse<files_dtos::FileStateResponseDto>,
            ApiResponse<files_dtos::UploadUrlResponseDto>,
            // Favorites
            favorites_dtos::FavoriteResponseDto,
            favorites_dtos::ToggleFavoriteResponseDto,
            ApiResponse<favorites_dtos::ToggleFavoriteResponseDto>,
            ApiResponse<Vec<favorites_dtos::FavoriteResponseDto>>,
            // Users
            users_models::OrgRole,
            users_models::Membership,
            users_dtos::UserResponseDto,
            users_dtos::UserProfileDto,
            users_dtos::CreateUserDto,
            users_dtos::UpdateUserDto,
            users_dtos::AddMembershipDto,
            users_dtos::RemoveMembershipDto,
            users_dtos::MembershipsResponseDto,
            ApiResponse<users_dtos::UserResponseDto>,
            ApiResponse<users_dtos::UserProfileDto>,
            ApiResponse<users_dtos::MembershipsResponseDto>,
        )
    ),
    tags(
        (name = "files", description = "Org-scoped file records, trash and restore"),
        (name = "favorites", description = "Per-user favorites"),
        (name = "users", description = "Caller account and user profiles"),
        (name = "provisioning", description = "Identity provider hooks (basic auth)"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "File Vault API",
        version = "0.1.0",
        description = "API documentation for the organization file vault",
    )
)]
pub struct ApiDoc;

/// Adds the Bearer JWT and provisioning basic-auth schemes to the OpenAPI spec
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
            components.add_security_scheme(
                "basic_auth",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Basic).build()),
            );
        }
    }
}

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
