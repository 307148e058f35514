/// Entity abstraction for hubd
///
/// All entities (thermostats, links, ...) implement the Entity trait. Platform
/// traits such as `ThermostatDevice` build on it.
pub trait Entity: Send + Sync {
    /// Entity id in `platform.object_id` form (e.g. "weblink.router")
    fn entity_id(&self) -> &str;

    /// Human-readable name
    fn name(&self) -> &str;

    /// Return the platform type of this entity (e.g. "thermostat", "weblink")
    fn platform(&self) -> &'static str;

    /// Icon shown next to the entity, if any
    fn icon(&self) -> Option<&str> {
        None
    }

    /// Primary display value of the entity
    fn state(&self) -> String;
}
