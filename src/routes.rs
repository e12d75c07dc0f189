use crate::{api::attendance, config::Config};
use actix_web::web;

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    cfg.service(
        web::scope(&config.api_prefix).service(
            web::scope("/attendance")
                // /attendance
                .service(web::resource("").route(web::get().to(attendance::list_attendance)))
                // /attendance/all
                .service(web::resource("/all").route(web::get().to(attendance::list_all_attendance)))
                // /attendance/punch-in, /attendance/punch-out
                .service(web::resource("/punch-in").route(web::post().to(attendance::punch_in)))
                .service(web::resource("/punch-out").route(web::post().to(attendance::punch_out))),
        ),
    );
}
