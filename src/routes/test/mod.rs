use std::path::Path;

use crate::config::AppConfig;

/// Builds the full application around `$db` and `$config`, the way `main` does.
macro_rules! test_app {
    ($db:expr, $config:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new($config.clone()))
                .app_data(actix_web::web::Data::new($db.clone()))
                .app_data(actix_web::web::FormConfig::default().limit(crate::response::BODY_LIMIT))
                .configure(crate::routes::config)
                .default_service(actix_web::web::to(crate::routes::system::not_found)),
        )
        .await
    };
}

mod notice;

pub fn test_config(upload_dir: &Path) -> AppConfig {
    AppConfig {
        server_port: 0,
        database_url: "sqlite::memory:".to_string(),
        pool_max: 1,
        pool_min: 1,
        sql_logging: false,
        upload_dir: upload_dir.to_path_buf(),
    }
}

const BOUNDARY: &str = "----site-backend-test-boundary";

/// Hand-assembled `multipart/form-data` body.
#[derive(Default)]
pub struct MultipartBody {
    body: Vec<u8>,
}

impl MultipartBody {
    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, content_type: &str, data: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                BOUNDARY, name, file_name, content_type
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    /// Content type header value and the finished body.
    pub fn finish(mut self) -> (String, Vec<u8>) {
        self.body
            .extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        (format!("multipart/form-data; boundary={}", BOUNDARY), self.body)
    }
}
