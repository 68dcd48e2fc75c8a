pub mod board;
pub mod crud;
pub mod news;
pub mod notice;
pub mod quote_inquiry;
pub mod system;

#[cfg(test)]
mod test;

use actix_web::web;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(web::scope("/board").configure(board::config))
            .service(web::scope("/notice").configure(notice::config))
            .service(web::scope("/news").configure(news::config))
            .service(web::scope("/quote-inquiry").configure(quote_inquiry::config)),
    )
    .configure(system::config);
}
