use crate::azure::models::{Container, ContainerGroup};

const MISSING: &str = "nil";

fn or_nil<T: ToString>(value: Option<T>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| MISSING.to_string())
}

fn debug_or_nil<T: std::fmt::Debug>(value: Option<T>) -> String {
    value
        .map(|v| format!("{:?}", v))
        .unwrap_or_else(|| MISSING.to_string())
}

fn compact_json<T: serde::Serialize>(value: Option<&T>) -> String {
    value
        .and_then(|v| serde_json::to_string(v).ok())
        .unwrap_or_else(|| "{}".to_string())
}

/// Multi-line summary of a listed container group.
///
/// Absent fields print as `nil`; instance views print as compact JSON.
pub fn summarize(group: &ContainerGroup) -> String {
    let props = group.properties.as_ref();
    let first: Option<&Container> = props.and_then(|p| p.containers.first());
    let container = first.map(|c| &c.properties);

    let name = group.name.as_deref().unwrap_or(MISSING);
    let command = container.and_then(|c| c.command.first().map(String::as_str));
    let image = container
        .and_then(|c| c.image.as_deref())
        .filter(|i| !i.is_empty());
    let cpu = container.and_then(|c| c.resources.requests.cpu);
    let ip = props
        .and_then(|p| p.ip_address.as_ref())
        .and_then(|ip| ip.ip.as_deref());

    format!(
        "{} info:\n\
         commands: {}\n\
         image: {}\n\
         CPU resource: {}\n\
         provisioningState: {}\n\
         OSType: {}\n\
         SKU: {}\n\
         IPAddress: {}\n\
         InstanceView: {}\n\
         Container InstanceView: {}\n",
        name,
        or_nil(command),
        or_nil(image),
        or_nil(cpu),
        or_nil(props.and_then(|p| p.provisioning_state.as_deref())),
        debug_or_nil(props.and_then(|p| p.os_type)),
        debug_or_nil(props.and_then(|p| p.sku)),
        or_nil(ip),
        compact_json(props.and_then(|p| p.instance_view.as_ref())),
        compact_json(container.and_then(|c| c.instance_view.as_ref())),
    )
}
