#[cfg(test)]
mod tests {
    use crate::schemas::ApiDoc;
    use utoipa::OpenApi;

    #[test]
    fn test_openapi_schema_generation() {
        let openapi = ApiDoc::openapi();

        // The document must identify this service, not a placeholder.
        assert_eq!(openapi.info.title, "Kefalet API");
        assert_eq!(openapi.info.version, env!("CARGO_PKG_VERSION"));

        let components = openapi.components.as_ref().expect("components must be present");
        assert!(components.schemas.contains_key("ErrorResponse"));
        assert!(components.schemas.contains_key("HealthResponse"));
        assert!(components.schemas.contains_key("MonthlyStatus"));
        assert!(components.schemas.contains_key("DashboardData"));

        // The whole document must serialize cleanly.
        assert!(serde_json::to_string(&openapi).is_ok());
    }

    #[test]
    fn test_error_response_schema_structure() {
        let openapi = ApiDoc::openapi();
        let components = openapi.components.as_ref().unwrap();
        let error_response_schema = components.schemas.get("ErrorResponse").unwrap();

        if let utoipa::openapi::RefOr::T(utoipa::openapi::schema::Schema::Object(obj)) = error_response_schema {
            let properties = &obj.properties;
            assert!(properties.contains_key("error"));
            assert!(properties.contains_key("code"));
            assert!(properties.contains_key("success"));
        } else {
            panic!("ErrorResponse should be an object schema");
        }
    }

    #[test]
    fn test_health_response_schema_structure() {
        let openapi = ApiDoc::openapi();
        let components = openapi.components.as_ref().unwrap();
        let health_response_schema = components.schemas.get("HealthResponse").unwrap();

        if let utoipa::openapi::RefOr::T(utoipa::openapi::schema::Schema::Object(obj)) = health_response_schema {
            let properties = &obj.properties;
            assert!(properties.contains_key("status"));
            assert!(properties.contains_key("version"));
            assert!(properties.contains_key("database"));
        } else {
            panic!("HealthResponse should be an object schema");
        }
    }

    #[test]
    fn test_openapi_paths_contain_health_endpoint() {
        let openapi = ApiDoc::openapi();

        assert!(openapi.paths.paths.contains_key("/health"));

        let health_path = openapi.paths.paths.get("/health").unwrap();
        let health_get = health_path
            .operations
            .get(&utoipa::openapi::PathItemType::Get)
            .expect("health must document a GET operation");

        // Both the healthy and the failure response must be documented.
        assert!(health_get.responses.responses.contains_key("200"));
        assert!(health_get.responses.responses.contains_key("500"));
    }

    #[test]
    fn test_openapi_paths_cover_engine_endpoints() {
        let openapi = ApiDoc::openapi();
        let paths = &openapi.paths.paths;

        for path in [
            "/api/v1/sponsors",
            "/api/v1/sponsors/{sponsor_id}",
            "/api/v1/sponsors/{sponsor_id}/debt",
            "/api/v1/orphans",
            "/api/v1/groups",
            "/api/v1/groups/{group_id}/members",
            "/api/v1/groups/{group_id}/members/{sponsor_id}/periods",
            "/api/v1/groups/{group_id}/statement",
            "/api/v1/groups/{group_id}/orphan-payments",
            "/api/v1/payments",
            "/api/v1/dashboard",
        ] {
            assert!(paths.contains_key(path), "missing path in OpenAPI doc: {}", path);
        }
    }

    #[test]
    fn test_all_error_responses_reference_correct_schema() {
        let openapi = ApiDoc::openapi();
        let openapi_json = serde_json::to_string(&openapi).unwrap();

        // Fully-qualified Rust paths leaking into $ref targets would break
        // Swagger UI rendering.
        assert!(!openapi_json.contains("crate.schemas.ErrorResponse"));
        assert!(!openapi_json.contains("crate::schemas::ErrorResponse"));
        assert!(openapi_json.contains("ErrorResponse"));
    }
}
