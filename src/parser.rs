// Reads Swagger documents and turns them into endpoint descriptors grouped by section.

pub mod endpoints;
pub mod options;
pub mod reference;
pub mod schema;
pub mod swagger;

pub use endpoints::{
    extract_endpoints,
    operation_name,
    BodyOutcome,
    BodyStatus,
    EndpointDescriptor,
    EndpointExtractor,
    ParamLocation,
    ParameterDescriptor,
    SectionedEndpoints,
};
pub use options::{MethodFilter, ParseOptions};
pub use reference::{resolve_ref, SchemaError};
pub use schema::{ExpandedSchema, SchemaNode, SchemaValue, SchemaWalker};
pub use swagger::{
    parse_swagger_file,
    parse_swagger_string,
    parse_swagger_value,
    read_swagger_file,
    ParserError,
    Result,
    SchemaSource,
};
