//! Stagehand - Rackspace demo environment lifecycle orchestrator.
//!
//! # Architecture
//!
//! ```text
//! src/
//! ├── cli/              # Command-line interface
//! │   ├── create        # Provision an environment
//! │   ├── scale         # Execute a scaling policy
//! │   ├── destroy       # Tear an environment down
//! │   ├── nodes         # List an environment's servers
//! │   ├── policies      # Print the policy catalog
//! │   └── output        # Terminal output helpers
//! └── core/             # Core library components
//!     ├── config        # Flag > env > file > default resolution
//!     ├── naming        # Resource names from app/environment
//!     ├── template      # {{ name }} substitution
//!     ├── personality   # Server boot file rendering
//!     ├── policy        # Scaling policy catalog
//!     ├── domain/       # Provider request/resource types
//!     ├── provider/     # Cloud providers
//!     │   ├── mod       # CloudProvider trait
//!     │   ├── rackspace # REST implementation
//!     │   └── simulated # In-memory implementation
//!     ├── provisioner   # Load balancer, group, policies
//!     ├── dns           # Subdomain record sync
//!     ├── poller        # Convergence wait
//!     └── lifecycle     # Create, teardown, scale, query
//! ```
//!
//! # Features
//!
//! - One command builds a load-balanced Windows autoscaling group
//! - Boot-time configuration injected as rendered personality files
//! - DNS records kept in sync with the load balancer
//! - Convergence wait with configurable backoff and timeout
//! - Dry-run mode against an in-memory cloud

pub mod cli;
pub mod core;
pub mod error;
