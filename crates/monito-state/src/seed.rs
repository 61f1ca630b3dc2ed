//! Demo catalog loaded into a fresh store.

use crate::types::{ServiceStatus, ServiceType};

/// A pre-populated service. Unlike user-created services it carries its own
/// uptime figure.
#[derive(Debug, Clone, PartialEq)]
pub struct SeedService {
    pub name: &'static str,
    pub kind: ServiceType,
    pub status: ServiceStatus,
    pub url: Option<&'static str>,
    pub description: &'static str,
    pub uptime: f64,
}

/// The five services the dashboard ships with.
pub fn demo_catalog() -> Vec<SeedService> {
    vec![
        SeedService {
            name: "User Authentication API",
            kind: ServiceType::Api,
            status: ServiceStatus::Online,
            url: Some("https://auth.monitocorp.com"),
            description: "Handles user authentication and authorization",
            uptime: 99.8,
        },
        SeedService {
            name: "Main Database",
            kind: ServiceType::Database,
            status: ServiceStatus::Online,
            url: None,
            description: "Primary PostgreSQL database cluster",
            uptime: 99.9,
        },
        SeedService {
            name: "Payment Processing",
            kind: ServiceType::Api,
            status: ServiceStatus::Degraded,
            url: Some("https://payments.monitocorp.com"),
            description: "Stripe payment processing service",
            uptime: 97.2,
        },
        SeedService {
            name: "Redis Cache",
            kind: ServiceType::Cache,
            status: ServiceStatus::Online,
            url: None,
            description: "Primary Redis cache cluster",
            uptime: 99.95,
        },
        SeedService {
            name: "Email Queue",
            kind: ServiceType::Queue,
            status: ServiceStatus::Offline,
            url: None,
            description: "RabbitMQ email processing queue",
            uptime: 94.1,
        },
    ]
}
