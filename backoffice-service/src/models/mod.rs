//! Domain models for backoffice-service.

mod communication;
mod contact;
mod document;
mod order;
mod partner;
mod product;
mod quote;
mod resource;
mod site;
mod task;
mod vat;

pub use communication::{
    Communication, CommunicationChannel, CommunicationDirection, CreateCommunication,
    ListCommunicationsFilter,
};
pub use contact::{Contact, CreateContact, ListContactsFilter, UpdateContact};
pub use document::{CreateDocument, Document, ListDocumentsFilter, UpdateDocument};
pub use order::{
    CreateOrder, CreateOrderItem, ListOrdersFilter, Order, OrderItem, OrderStatus, OrderWithItems,
    UpdateOrder,
};
pub use partner::{CreatePartner, ListPartnersFilter, Partner, UpdatePartner};
pub use product::{
    CreateProductPrice, ListProductPricesFilter, PartnerProductPrice, ProductPrice,
    SetPartnerProductPrice, UpdateProductPrice,
};
pub use quote::{
    CreateQuote, CreateQuoteItem, ListQuotesFilter, Quote, QuoteItem, QuoteItemDiscount,
    QuoteItemWithDiscount, QuoteStatus, QuoteWithItems, UpdateQuote,
};
pub use resource::{CreateResource, ListResourcesFilter, Resource, ResourceStatus, UpdateResource};
pub use site::{CreateSite, ListSitesFilter, Site, UpdateSite};
pub use task::{CreateTask, ListTasksFilter, Task, TaskStatus, UpdateTask};
pub use vat::{CreateVatType, UpdateVatType, VatType};
