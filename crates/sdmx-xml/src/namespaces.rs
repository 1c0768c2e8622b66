//! SDMX-ML 2.1 namespaces and prefixes.

pub const MESSAGE: &str = "http://www.sdmx.org/resources/sdmxml/schemas/v2_1/message";
pub const COMMON: &str = "http://www.sdmx.org/resources/sdmxml/schemas/v2_1/common";
pub const STRUCTURE: &str = "http://www.sdmx.org/resources/sdmxml/schemas/v2_1/structure";
pub const GENERIC: &str = "http://www.sdmx.org/resources/sdmxml/schemas/v2_1/data/generic";
pub const STRUCTURE_SPECIFIC: &str =
    "http://www.sdmx.org/resources/sdmxml/schemas/v2_1/data/structurespecific";
pub const XSI: &str = "http://www.w3.org/2001/XMLSchema-instance";
pub const XML: &str = "http://www.w3.org/XML/1998/namespace";

/// Namespace of a structure-specific dataset for one structure and axis.
pub fn structure_specific_namespace(unique_id: &str, dim_at_obs: &str) -> String {
    format!(
        "urn:sdmx:org.sdmx.infomodel.datastructure.DataStructure={unique_id}:ObsLevelDim:{dim_at_obs}"
    )
}
