//! End-to-end synchronization tests driving the public API

use geoanchor::prelude::*;

fn redlands() -> GeographicPosition {
    GeographicPosition::new(-117.1825, 34.0556, 300.0, SpatialReferenceId::WGS84)
}

#[test]
fn test_geographic_round_trip_through_engine_space() {
    let mut world = GeoWorld::new(GeoWorldConfig::default(), MapType::Global);
    let mut host = EngineWorld::new();
    let resolver = BuiltinResolver;

    let object = host.spawn_object(EngineTransform::IDENTITY);
    world.attach(
        object,
        world.default_root(),
        redlands(),
        GeographicRotation::default(),
    );
    world.tick(&mut host, &resolver);

    // Detach-free read back: the stored geographic position is untouched by
    // the projection into engine space
    let geo = world.geographic_position(object).unwrap();
    assert!((geo.x - -117.1825).abs() < 1e-6);
    assert!((geo.y - 34.0556).abs() < 1e-6);
    assert!((geo.z - 300.0).abs() < 1e-3);

    // Now pull the other way: force a one-meter drag and verify the
    // recovered geographic position moves by the right amount
    let mut engine = host.local_transform(object).unwrap();
    engine.position.z += 250.0;
    host.set_local_transform(object, engine);
    world.tick(&mut host, &resolver);

    let dragged = world.geographic_position(object).unwrap();
    assert!((dragged.x - -117.1825).abs() < 1e-4);
    assert!((dragged.y - 34.0556).abs() < 1e-4);
    assert!(dragged.z > 300.0);
}

#[test]
fn test_camera_flight_triggers_threshold_rebase() {
    let mut config = GeoWorldConfig::default();
    config.rebase_threshold = 10_000.0;
    let mut world = GeoWorld::new(config, MapType::Local);
    let mut host = EngineWorld::new();
    let resolver = BuiltinResolver;

    let camera = host.spawn_object(EngineTransform::IDENTITY);
    world.attach(
        camera,
        world.default_root(),
        GeographicPosition::new(0.0, 0.0, 100.0, SpatialReferenceId::WGS84),
        GeographicRotation::default(),
    );
    world.set_rebase_source(camera, true);
    world.tick(&mut host, &resolver);

    let mut rebases = 0;
    // Fly east in 2km steps; every time the camera gets further than 10km
    // from the root, the root catches up
    for _ in 0..20 {
        let mut engine = host.local_transform(camera).unwrap();
        engine.position.x += 2_000.0;
        host.set_local_transform(camera, engine);
        rebases += world.tick(&mut host, &resolver);

        // The invariant the whole system exists for: engine coordinates
        // never stray far from the origin
        let local = host.local_transform(camera).unwrap().position;
        assert!(local.length() <= 12_001.0);
    }
    assert!(rebases >= 3);

    // 40km of flight survived into the geographic position
    let geo = world.geographic_position(camera).unwrap();
    assert!((geo.x - 40_000.0 / 111_319.49).abs() < 1e-3);
}

#[test]
fn test_mixed_roots_are_independent() {
    let mut world = GeoWorld::new(GeoWorldConfig::default(), MapType::Local);
    let mut host = EngineWorld::new();
    let resolver = BuiltinResolver;

    let near = host.spawn_object(EngineTransform::IDENTITY);
    let far = host.spawn_object(EngineTransform::IDENTITY);
    let near_root = world.default_root();
    let far_root = world.create_root();

    world.attach(
        near,
        near_root,
        GeographicPosition::new(0.001, 0.0, 0.0, SpatialReferenceId::WGS84),
        GeographicRotation::default(),
    );
    world.attach(
        far,
        far_root,
        GeographicPosition::new(9.0, 0.0, 0.0, SpatialReferenceId::WGS84),
        GeographicRotation::default(),
    );
    world.set_rebase_source(far, true);
    world.tick(&mut host, &resolver);

    // Only the far root moved; the near object's engine placement is
    // unaffected by the other root's rebase
    assert!(host.local_transform(far).unwrap().position.length() < 1.0);
    let near_engine = host.local_transform(near).unwrap().position;
    assert!((near_engine.x as f64 - 111.3).abs() < 0.5);
    let near_root_state = world.root(near_root).unwrap();
    assert_eq!(near_root_state.universe_position(), DVec3::ZERO);
}

#[test]
fn test_on_demand_synchronization_before_read() {
    let mut world = GeoWorld::new(GeoWorldConfig::default(), MapType::Local);
    let mut host = EngineWorld::new();
    let resolver = BuiltinResolver;

    let object = host.spawn_object(EngineTransform::from_position(Vec3::new(
        111_319.49,
        0.0,
        50.0,
    )));
    world.attach_at_engine(object, world.default_root());

    // No tick has run; synchronize just this object ahead of the read
    assert!(world.synchronize_object(object, &mut host, &resolver));

    let geo = world.geographic_position(object).unwrap();
    assert!((geo.x - 1.0).abs() < 1e-4);
    assert!((geo.z - 50.0).abs() < 1e-3);
}

#[test]
fn test_detach_stops_synchronization() {
    let mut world = GeoWorld::new(GeoWorldConfig::default(), MapType::Local);
    let mut host = EngineWorld::new();
    let resolver = BuiltinResolver;

    let object = host.spawn_object(EngineTransform::IDENTITY);
    world.attach(
        object,
        world.default_root(),
        GeographicPosition::new(0.5, 0.5, 0.0, SpatialReferenceId::WGS84),
        GeographicRotation::default(),
    );
    world.tick(&mut host, &resolver);
    let placed = host.local_transform(object).unwrap();

    assert!(world.detach(object));
    assert!(world.geographic_position(object).is_none());

    // The host transform is left as-is and later ticks ignore the object
    world.tick(&mut host, &resolver);
    assert_eq!(host.local_transform(object).unwrap(), placed);
}
