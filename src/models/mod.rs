pub mod company;
pub mod contract;
pub mod employment;
pub mod mapping;

pub use company::{CompanyInfo, Department, NewDepartment};
pub use contract::{Contract, ContractPeriod, Employee};
pub use employment::{EmploymentSettings, Holidays, Resignation, Retirement, WorkRegulations};
pub use mapping::{
    MainField, MainFieldAssignment, MappingConfiguration, MappingDocument, MappingItem,
    StoredMainField, StoredMainFields, SymbolConvention, UnknownMainField,
};
