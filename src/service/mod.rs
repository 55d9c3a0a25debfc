//! CrudService: generic CRUD using the safe SQL builder. AssociationService: link, cascade and propagation rules.

mod associations;
mod crud;
mod validation;
pub use associations::AssociationService;
pub use crud::CrudService;
pub use validation::RequestValidator;
