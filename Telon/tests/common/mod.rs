//! Payloads shared by the integration tests

fn f32s(out: &mut Vec<u8>, values: &[f32]) {
    for value in values {
        out.extend(value.to_le_bytes());
    }
}

fn i32s(out: &mut Vec<u8>, values: &[i32]) {
    for value in values {
        out.extend(value.to_le_bytes());
    }
}

/// A triangle StaticMesh with an empty property list, empty core streams,
/// a zero skip pointer and a single three-vertex LOD. Every byte of it is
/// structure, so it decodes completely.
pub fn triangle_mesh() -> Vec<u8> {
    let mut out = vec![0x00];

    // bounding box and sphere
    f32s(&mut out, &[-2.0, -2.0, 0.0, 2.0, 2.0, 0.5]);
    f32s(&mut out, &[0.0, 0.0, 0.25, 2.9]);

    // content version, one compact section
    i32s(&mut out, &[12, 1]);
    out.extend(0u32.to_le_bytes());
    for value in [0u16, 0, 2, 1, 1] {
        out.extend(value.to_le_bytes());
    }

    // vertex, color, alpha streams
    i32s(&mut out, &[0, 1, 0, 1, 0, 1]);
    // no UV streams
    i32s(&mut out, &[0]);
    // index, wireframe streams
    i32s(&mut out, &[0, 1, 0, 1]);
    // collision
    i32s(&mut out, &[0, 0, 0]);

    // skip padding and a null pointer
    out.extend([0u8; 6]);
    out.extend(0u32.to_le_bytes());

    // post-skip header: physics ref, auth key, LOD version, LOD count
    i32s(&mut out, &[0, 0x5A5A, 1, 1]);

    // LOD header and vertices
    i32s(&mut out, &[1, 0, 3]);
    for corner in [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]] {
        f32s(&mut out, &[corner[0], corner[1], 0.0]);
        f32s(&mut out, &[0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
        f32s(&mut out, &corner);
    }

    // index buffer
    out.extend(3u32.to_le_bytes());
    for index in [0u16, 1, 2] {
        out.extend(index.to_le_bytes());
    }
    out
}
