use crate::{
    api::{attendance, dashboard, reports, settings, users},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};

fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / requests_per_min as u64).max(1);

    // Both values are non-zero, so the builder always yields a config.
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .unwrap_or_default();
    Governor::new(&cfg)
}

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    let login_limiter = build_limiter(config.rate_login_per_min);
    let protected_limiter = build_limiter(config.rate_protected_per_min);

    // Public routes
    cfg.service(
        web::scope("/auth").service(
            web::resource("/login")
                .wrap(login_limiter)
                .route(web::post().to(handlers::login)),
        ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware))
            .wrap(protected_limiter)
            .service(
                web::scope("/attendance")
                    // /attendance/today
                    .service(web::resource("/today").route(web::get().to(attendance::today)))
                    // /attendance/{transition}
                    .service(
                        web::resource("/{transition}")
                            .route(web::post().to(attendance::record_transition)),
                    ),
            )
            .service(
                web::scope("/settings").service(
                    web::resource("/expected-start")
                        .route(web::get().to(settings::get_expected_start))
                        .route(web::put().to(settings::put_expected_start)),
                ),
            )
            .service(
                web::scope("/reports")
                    .service(web::resource("").route(web::get().to(reports::list_reports)))
                    .service(web::resource("/search").route(web::get().to(reports::search_history)))
                    .service(web::resource("/export/xlsx").route(web::get().to(reports::export_xlsx)))
                    .service(
                        web::resource("/export/print").route(web::get().to(reports::export_print)),
                    ),
            )
            .service(
                web::scope("/dashboard")
                    .service(web::resource("/summary").route(web::get().to(dashboard::summary)))
                    .service(web::resource("/recent").route(web::get().to(dashboard::recent))),
            )
            .service(
                web::scope("/users")
                    // /users
                    .service(
                        web::resource("")
                            .route(web::get().to(users::list_users))
                            .route(web::post().to(users::create_user)),
                    )
                    // /users/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(users::update_user))
                            .route(web::delete().to(users::delete_user)),
                    ),
            ),
    );
}
