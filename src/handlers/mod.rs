// Public routes need no token; protected routes run behind jwt_auth_middleware
pub mod protected;
pub mod public;
