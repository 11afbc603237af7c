pub mod company;
pub mod contracts;
pub mod mapping;
pub mod resolver;

pub use company::CompanyService;
pub use contracts::ContractService;
pub use mapping::{MainFieldsView, MappingService, MappingSessions};
